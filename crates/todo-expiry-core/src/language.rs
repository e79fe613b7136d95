//! Per-language comment recognition.
//!
//! A file is mapped to a [`DelimiterStyle`] through its extension, or through a
//! well-known file name alias for files that have none (`Gemfile`, `Makefile`).
//! Unregistered files are never treated as containing comments.

use std::sync::LazyLock;

use regex::Regex;

/// Line-comment delimiter families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DelimiterStyle {
    /// `#`: Ruby, Python, shell, YAML.
    Hash,
    /// `//`: C family, JavaScript, Go, Rust.
    DoubleSlash,
    /// `--`: SQL, Haskell, Lua.
    DoubleDash,
    /// `;`: Lisps, assembly.
    Semicolon,
}

static HASH_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"#\s*(.+)$").unwrap());
static DOUBLE_SLASH_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"//\s*(.+)$").unwrap());
static DOUBLE_DASH_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"--\s*(.+)$").unwrap());
static SEMICOLON_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r";\s*(.+)$").unwrap());

impl DelimiterStyle {
    fn pattern(self) -> &'static Regex {
        match self {
            Self::Hash => &*HASH_PATTERN,
            Self::DoubleSlash => &*DOUBLE_SLASH_PATTERN,
            Self::DoubleDash => &*DOUBLE_DASH_PATTERN,
            Self::Semicolon => &*SEMICOLON_PATTERN,
        }
    }

    /// Text following the first delimiter that has at least one character
    /// after it. The delimiter may sit anywhere in the line.
    pub fn comment_text(self, line: &str) -> Option<&str> {
        self.pattern()
            .captures(line)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }
}

/// File names without an extension that stand in for a registered extension.
const FILE_ALIASES: &[(&str, &str)] = &[
    ("Gemfile", "rb"),
    ("Rakefile", "rb"),
    ("Dockerfile", "sh"),
    ("Makefile", "sh"),
];

/// Extension → delimiter style.
const LANGUAGE_RULES: &[(&str, DelimiterStyle)] = &[
    // Ruby, Python, shells, config
    ("rb", DelimiterStyle::Hash),
    ("py", DelimiterStyle::Hash),
    ("sh", DelimiterStyle::Hash),
    ("bash", DelimiterStyle::Hash),
    ("zsh", DelimiterStyle::Hash),
    ("yaml", DelimiterStyle::Hash),
    ("yml", DelimiterStyle::Hash),
    ("toml", DelimiterStyle::Hash),
    ("r", DelimiterStyle::Hash),
    ("pl", DelimiterStyle::Hash),
    ("ex", DelimiterStyle::Hash),
    ("exs", DelimiterStyle::Hash),
    ("tf", DelimiterStyle::Hash),
    // C family, JVM, web
    ("js", DelimiterStyle::DoubleSlash),
    ("mjs", DelimiterStyle::DoubleSlash),
    ("cjs", DelimiterStyle::DoubleSlash),
    ("ts", DelimiterStyle::DoubleSlash),
    ("jsx", DelimiterStyle::DoubleSlash),
    ("tsx", DelimiterStyle::DoubleSlash),
    ("java", DelimiterStyle::DoubleSlash),
    ("c", DelimiterStyle::DoubleSlash),
    ("h", DelimiterStyle::DoubleSlash),
    ("cpp", DelimiterStyle::DoubleSlash),
    ("hpp", DelimiterStyle::DoubleSlash),
    ("cc", DelimiterStyle::DoubleSlash),
    ("cs", DelimiterStyle::DoubleSlash),
    ("go", DelimiterStyle::DoubleSlash),
    ("rs", DelimiterStyle::DoubleSlash),
    ("kt", DelimiterStyle::DoubleSlash),
    ("swift", DelimiterStyle::DoubleSlash),
    ("scala", DelimiterStyle::DoubleSlash),
    ("dart", DelimiterStyle::DoubleSlash),
    ("php", DelimiterStyle::DoubleSlash),
    // SQL, Haskell, Lua
    ("sql", DelimiterStyle::DoubleDash),
    ("hs", DelimiterStyle::DoubleDash),
    ("lua", DelimiterStyle::DoubleDash),
    ("elm", DelimiterStyle::DoubleDash),
    // Lisps, assembly
    ("lisp", DelimiterStyle::Semicolon),
    ("el", DelimiterStyle::Semicolon),
    ("clj", DelimiterStyle::Semicolon),
    ("scm", DelimiterStyle::Semicolon),
    ("asm", DelimiterStyle::Semicolon),
];

/// Resolve the delimiter style for a file path, or `None` if the language is
/// not registered.
pub fn delimiter_for(file: &str) -> Option<DelimiterStyle> {
    let basename = file.rsplit('/').next().unwrap_or(file);

    let ext = FILE_ALIASES
        .iter()
        .find(|(alias, _)| *alias == basename)
        .map(|(_, ext)| *ext)
        .unwrap_or_else(|| basename.rsplit('.').next().unwrap_or(basename));

    LANGUAGE_RULES
        .iter()
        .find(|(rule_ext, _)| *rule_ext == ext)
        .map(|(_, style)| *style)
}

/// Whether `line` carries a comment in the language of `file`.
pub fn is_comment(file: &str, line: &str) -> bool {
    delimiter_for(file).is_some_and(|style| style.comment_text(line).is_some())
}
