//! Gitignore-style pattern rules and the engine that evaluates them.
//!
//! Matching follows shell-glob rules: `*` matches any run of characters
//! (including `/`), `?` exactly one character, `[...]` a character class.
//! Everything else is literal: braces, backslashes, and a `[` that is never
//! closed.
//! Rules are evaluated in configuration order and the last matching rule
//! decides whether a path is excluded.

use globset::{GlobBuilder, GlobMatcher};
use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

/// Name of the ignore file looked up at the project root.
pub const IGNORE_FILE_NAME: &str = ".gitignore";

/// One compiled ignore directive.
#[derive(Debug, Clone)]
pub struct PatternRule {
    pattern: String,
    negated: bool,
    directory_only: bool,
    anchored: bool,
    exact: GlobMatcher,
    nested: Option<GlobMatcher>,
    inside: Option<GlobMatcher>,
}

impl PatternRule {
    /// Compiles a raw ignore line.
    ///
    /// Returns `None` for blank lines, lines that are nothing but markers
    /// (`!`, `/`), and globs that fail to compile. A leading `#` is literal
    /// here; comments are only stripped when reading the ignore file.
    pub fn parse(line: &str) -> Option<Self> {
        let mut pattern = line.trim();
        if pattern.is_empty() {
            return None;
        }

        let negated = pattern.starts_with('!');
        if negated {
            pattern = &pattern[1..];
        }

        let directory_only = pattern.ends_with('/');
        if directory_only {
            pattern = &pattern[..pattern.len() - 1];
        }

        let anchored = pattern.starts_with('/');
        if anchored {
            pattern = &pattern[1..];
        }

        if pattern.is_empty() {
            return None;
        }

        match Self::compile(pattern, anchored) {
            Ok((exact, nested, inside)) => Some(Self {
                pattern: pattern.to_string(),
                negated,
                directory_only,
                anchored,
                exact,
                nested,
                inside,
            }),
            Err(e) => {
                tracing::warn!("Skipping invalid ignore pattern '{}': {}", line.trim(), e);
                None
            }
        }
    }

    fn compile(
        pattern: &str,
        anchored: bool,
    ) -> Result<(GlobMatcher, Option<GlobMatcher>, Option<GlobMatcher>), globset::Error> {
        let exact = glob_matcher(pattern)?;
        if anchored {
            return Ok((exact, None, None));
        }
        let nested = glob_matcher(&format!("*/{pattern}"))?;
        let inside = glob_matcher(&format!("*/{pattern}/*"))?;
        Ok((exact, Some(nested), Some(inside)))
    }

    /// The glob text with the `!`, leading `/` and trailing `/` markers removed.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn is_negated(&self) -> bool {
        self.negated
    }

    /// Set for lines ending in `/`. Not checked against the entry type.
    pub fn is_directory_only(&self) -> bool {
        self.directory_only
    }

    pub fn is_anchored(&self) -> bool {
        self.anchored
    }

    /// Whether the glob matches, ignoring negation.
    ///
    /// `relative_path` uses `/` separators and is measured from the scan root.
    pub fn matches(&self, relative_path: &str, file_name: &str) -> bool {
        if self.anchored {
            return self.exact.is_match(relative_path);
        }

        self.exact.is_match(file_name)
            || self.exact.is_match(relative_path)
            || self
                .nested
                .as_ref()
                .is_some_and(|glob| glob.is_match(relative_path))
            || self
                .inside
                .as_ref()
                .is_some_and(|glob| glob.is_match(relative_path))
    }
}

fn glob_matcher(pattern: &str) -> Result<GlobMatcher, globset::Error> {
    GlobBuilder::new(&shell_glob_to_globset(pattern))
        .literal_separator(false)
        .backslash_escape(false)
        .allow_unclosed_class(true)
        .case_insensitive(cfg!(windows))
        .build()
        .map(|glob| glob.compile_matcher())
}

/// Rewrites a shell glob into globset syntax with the same meaning.
///
/// Braces become single-character classes, runs of `*` collapse to one
/// (globset gives `**` a recursive meaning), and an unclosed `[` becomes a
/// literal bracket.
fn shell_glob_to_globset(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() + 8);
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '*' => {
                out.push('*');
                while chars.get(i + 1) == Some(&'*') {
                    i += 1;
                }
            }
            '{' => out.push_str("[{]"),
            '}' => out.push_str("[}]"),
            '[' => match class_end(&chars, i) {
                Some(end) => {
                    push_class(&mut out, &chars[i + 1..end]);
                    i = end;
                }
                None => out.push_str("[[]"),
            },
            c => out.push(c),
        }
        i += 1;
    }
    out
}

/// Index of the `]` closing the class opened at `start`. A `]` directly
/// after `[` or `[!` belongs to the class.
fn class_end(chars: &[char], start: usize) -> Option<usize> {
    let mut j = start + 1;
    if chars.get(j) == Some(&'!') {
        j += 1;
    }
    if chars.get(j) == Some(&']') {
        j += 1;
    }
    (j..chars.len()).find(|&k| chars[k] == ']')
}

fn push_class(out: &mut String, body: &[char]) {
    if body.first() != Some(&'^') {
        out.push('[');
        out.extend(body);
        out.push(']');
        return;
    }

    // A leading `^` is a literal member, but globset would read it as negation.
    let lead = body.iter().take_while(|c| matches!(c, '^' | '!')).count();
    let mut alternatives: Vec<String> = body[..lead].iter().map(char::to_string).collect();
    if lead < body.len() {
        alternatives.push(format!("[{}]", body[lead..].iter().collect::<String>()));
    }
    if alternatives.len() == 1 {
        out.push_str(&alternatives[0]);
    } else {
        out.push('{');
        out.push_str(&alternatives.join(","));
        out.push('}');
    }
}

/// Decides, for a candidate path under a base directory, whether it is excluded.
///
/// Each scanner owns its own engine; there is no shared configuration.
#[derive(Debug, Clone, Default)]
pub struct FilterEngine {
    rules: Vec<PatternRule>,
}

impl FilterEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an engine already configured with `patterns`.
    pub fn with_patterns<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut engine = Self::new();
        engine.configure(patterns);
        engine
    }

    /// Reads the project's ignore file and returns its meaningful lines.
    ///
    /// A missing or unreadable file yields no patterns.
    pub fn load_ignore_file(root: &Path) -> Vec<String> {
        let ignore_path = root.join(IGNORE_FILE_NAME);
        let content = match fs::read_to_string(&ignore_path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("No ignore file at {:?}", ignore_path);
                return Vec::new();
            }
            Err(e) => {
                tracing::warn!("Could not read ignore file {:?}: {}", ignore_path, e);
                return Vec::new();
            }
        };

        content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string)
            .collect()
    }

    /// Replaces the rule list, compiling each line in order.
    pub fn configure<I, S>(&mut self, patterns: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.rules = patterns
            .into_iter()
            .filter_map(|line| PatternRule::parse(line.as_ref()))
            .collect();
        tracing::debug!("Filter engine configured with {} rules", self.rules.len());
    }

    pub fn rules(&self) -> &[PatternRule] {
        &self.rules
    }

    /// Evaluates every rule against `candidate`; the last match wins.
    pub fn should_exclude(&self, candidate: &Path, base: &Path) -> bool {
        let relative_path = relative_slash_path(candidate, base);
        let file_name = candidate
            .file_name()
            .map(|name| name.to_string_lossy())
            .unwrap_or_default();

        let mut excluded = false;
        for rule in &self.rules {
            if rule.matches(&relative_path, &file_name) {
                excluded = !rule.negated;
            }
        }
        excluded
    }

    /// Keeps the paths that are not excluded, in their original order.
    pub fn filter_paths<P: AsRef<Path>>(&self, paths: &[P], base: &Path) -> Vec<PathBuf> {
        paths
            .iter()
            .map(AsRef::as_ref)
            .filter(|path| !self.should_exclude(path, base))
            .map(Path::to_path_buf)
            .collect()
    }
}

/// `candidate` relative to `base`, joined with `/`. Falls back to the
/// candidate itself when it does not live under `base`.
fn relative_slash_path(candidate: &Path, base: &Path) -> String {
    let relative = candidate.strip_prefix(base).unwrap_or(candidate);
    relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Patterns that are almost never wanted in a project overview.
pub fn common_ignore_patterns() -> Vec<String> {
    [
        "*.pyc",
        "__pycache__/",
        "*.pyo",
        "*.pyd",
        ".Python",
        "build/",
        "develop-eggs/",
        "dist/",
        "downloads/",
        "eggs/",
        ".eggs/",
        "lib/",
        "lib64/",
        "parts/",
        "sdist/",
        "var/",
        "wheels/",
        "*.egg-info/",
        ".installed.cfg",
        "*.egg",
        ".git/",
        ".svn/",
        ".hg/",
        ".idea/",
        ".vscode/",
        "*.log",
        "*.tmp",
        "*.temp",
        "node_modules/",
        "*.min.js",
        "*.min.css",
    ]
    .iter()
    .map(|pattern| pattern.to_string())
    .collect()
}
