use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::errors::{Result, XrefError};

/// Kinds of declared entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclKind {
    Function,
    Macro,
    Struct,
    Union,
    Enum,
    Enumerator,
    Typedef,
    Variable,
}

#[allow(clippy::should_implement_trait)]
impl DeclKind {
    /// Returns the string representation of this declaration kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            DeclKind::Function => "function",
            DeclKind::Macro => "macro",
            DeclKind::Struct => "struct",
            DeclKind::Union => "union",
            DeclKind::Enum => "enum",
            DeclKind::Enumerator => "enumerator",
            DeclKind::Typedef => "typedef",
            DeclKind::Variable => "variable",
        }
    }

    /// Parses a string into a `DeclKind`, returning `None` for unrecognized values.
    ///
    /// Doxygen's spellings (`define`, `enumvalue`) are accepted as aliases.
    pub fn from_str(s: &str) -> Option<DeclKind> {
        match s {
            "function" => Some(DeclKind::Function),
            "macro" | "define" => Some(DeclKind::Macro),
            "struct" => Some(DeclKind::Struct),
            "union" => Some(DeclKind::Union),
            "enum" => Some(DeclKind::Enum),
            "enumerator" | "enumvalue" => Some(DeclKind::Enumerator),
            "typedef" => Some(DeclKind::Typedef),
            "variable" => Some(DeclKind::Variable),
            _ => None,
        }
    }

    /// Whether call syntax in a reference selects this kind.
    pub fn is_callable(&self) -> bool {
        matches!(self, DeclKind::Function)
    }
}

impl fmt::Display for DeclKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A source position: file path and 1-based line.
///
/// Ordering is by file path, then line, which is the order ambiguous
/// candidates are reported in.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Location {
    pub file: String,
    pub line: u32,
}

impl Location {
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// Parameter shape of a callable declaration.
///
/// Parameter tags are the parameter type text as written (`int`, `char *`);
/// only their count takes part in resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignatureShape {
    pub params: Vec<String>,
    #[serde(default)]
    pub variadic: bool,
}

impl SignatureShape {
    pub fn new(params: Vec<String>) -> Self {
        Self {
            params,
            variadic: false,
        }
    }

    /// Builds a shape from a C argument list such as `(int a, const char *fmt, ...)`.
    ///
    /// `()` and `(void)` both denote zero parameters.
    pub fn from_argsstring(args: &str) -> Self {
        let inner = args.trim();
        let inner = inner.strip_prefix('(').unwrap_or(inner);
        let inner = match inner.rfind(')') {
            Some(end) => &inner[..end],
            None => inner,
        };

        let mut shape = SignatureShape::default();
        if inner.trim().is_empty() || inner.trim() == "void" {
            return shape;
        }

        for param in split_top_level(inner) {
            let param = param.split_whitespace().collect::<Vec<_>>().join(" ");
            if param == "..." {
                shape.variadic = true;
            } else {
                shape.params.push(param);
            }
        }
        shape
    }

    /// Number of fixed parameters.
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Whether a call with `count` arguments fits this shape.
    pub fn accepts(&self, count: usize) -> bool {
        count == self.arity() || (self.variadic && count >= self.arity())
    }
}

impl fmt::Display for SignatureShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<&str> = self.params.iter().map(String::as_str).collect();
        if self.variadic {
            parts.push("...");
        }
        if parts.is_empty() {
            f.write_str("(void)")
        } else {
            write!(f, "({})", parts.join(", "))
        }
    }
}

/// A normalized fact about one declared entity.
///
/// Records are immutable once built; the index only ever hands out shared
/// references to them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
    pub id: String,
    pub name: String,
    pub kind: DeclKind,
    pub signature: Option<SignatureShape>,
    pub location: Location,
    pub doc_summary: Option<String>,
}

impl Declaration {
    pub fn new(name: impl Into<String>, kind: DeclKind, location: Location) -> Self {
        let name = name.into();
        let id = generate_decl_id(&location.file, &kind, &name, location.line);
        Self {
            id,
            name,
            kind,
            signature: None,
            location,
            doc_summary: None,
        }
    }

    /// Attaches a signature shape. Ignored for non-callable kinds.
    pub fn with_signature(mut self, signature: SignatureShape) -> Self {
        if self.kind.is_callable() {
            self.signature = Some(signature);
        }
        self
    }

    /// Attaches the first non-blank line of `doc` as the summary.
    pub fn with_doc_summary(mut self, doc: &str) -> Self {
        self.doc_summary = doc
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(str::to_string);
        self
    }

    /// Arity of a function declaration; `None` for other kinds.
    pub fn arity(&self) -> Option<usize> {
        if !self.kind.is_callable() {
            return None;
        }
        Some(self.signature.as_ref().map_or(0, SignatureShape::arity))
    }

    /// Whether a call with `count` arguments fits this declaration.
    pub fn accepts_arity(&self, count: usize) -> bool {
        match (&self.kind, &self.signature) {
            (DeclKind::Function, Some(sig)) => sig.accepts(count),
            (DeclKind::Function, None) => count == 0,
            _ => false,
        }
    }

    /// Short human-readable form, e.g. `function referrent(int) at foo.c:14`.
    pub fn describe(&self) -> String {
        match &self.signature {
            Some(sig) => format!("{} {}{} at {}", self.kind, self.name, sig, self.location),
            None => format!("{} {} at {}", self.kind, self.name, self.location),
        }
    }
}

/// Disambiguating hint carried by a reference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallHint {
    /// Bare name, no call syntax.
    #[default]
    Bare,
    /// Call syntax with no visible argument count, e.g. `name()`.
    Call,
    /// Call syntax with a visible argument count, e.g. `name(a, b)`.
    Arity(usize),
}

impl CallHint {
    pub fn is_call(&self) -> bool {
        !matches!(self, CallHint::Bare)
    }

    pub fn arity(&self) -> Option<usize> {
        match self {
            CallHint::Arity(n) => Some(*n),
            _ => None,
        }
    }
}

/// A textual mention of a name inside a documentation comment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReferenceToken {
    /// The mention as written, e.g. `referrent(a)`.
    pub text: String,
    pub name: String,
    pub hint: CallHint,
    /// Location of the comment containing the mention.
    pub location: Location,
}

impl ReferenceToken {
    pub fn new(name: impl Into<String>, hint: CallHint, location: Location) -> Self {
        let name = name.into();
        let text = match hint {
            CallHint::Bare => name.clone(),
            CallHint::Call => format!("{}()", name),
            CallHint::Arity(0) => format!("{}(void)", name),
            CallHint::Arity(n) => {
                let args: Vec<String> = (0..n).map(|i| format!("a{}", i)).collect();
                format!("{}({})", name, args.join(", "))
            }
        };
        Self {
            text,
            name,
            hint,
            location,
        }
    }

    /// Parses a mention such as `name`, `name()` or `name(a, b)`.
    ///
    /// Empty parentheses carry call syntax but no argument count; `(void)`
    /// is an explicit count of zero, as in a C prototype.
    pub fn parse(text: &str, location: Location) -> Result<Self> {
        let trimmed = text.trim();
        let invalid = |message: String| XrefError::InvalidReference {
            message,
            location: location.clone(),
        };

        let (name, hint) = match trimmed.find('(') {
            None => {
                if trimmed.contains(')') {
                    return Err(invalid(format!("unbalanced parentheses in '{}'", trimmed)));
                }
                (trimmed, CallHint::Bare)
            }
            Some(open) => {
                let close = matching_paren(trimmed, open)
                    .ok_or_else(|| invalid(format!("unbalanced parentheses in '{}'", trimmed)))?;
                if close != trimmed.len() - 1 {
                    return Err(invalid(format!(
                        "unexpected text after argument list in '{}'",
                        trimmed
                    )));
                }
                let args = &trimmed[open + 1..close];
                let hint = match args.trim() {
                    "" => CallHint::Call,
                    "void" => CallHint::Arity(0),
                    _ => {
                        let parts = split_top_level(args);
                        if parts.iter().any(|p| p.is_empty()) {
                            return Err(invalid(format!(
                                "empty argument in '{}'",
                                trimmed
                            )));
                        }
                        CallHint::Arity(parts.len())
                    }
                };
                (trimmed[..open].trim_end(), hint)
            }
        };

        validate_name(name, &location)?;

        Ok(Self {
            text: trimmed.to_string(),
            name: name.to_string(),
            hint,
            location,
        })
    }
}

/// Checks that a reference name is non-empty and free of whitespace and
/// parentheses.
pub fn validate_name(name: &str, location: &Location) -> Result<()> {
    if name.is_empty() {
        return Err(XrefError::InvalidReference {
            message: "reference name is empty".to_string(),
            location: location.clone(),
        });
    }
    if name
        .chars()
        .any(|c| c.is_whitespace() || c == '(' || c == ')')
    {
        return Err(XrefError::InvalidReference {
            message: format!("reference name '{}' is not an identifier", name),
            location: location.clone(),
        });
    }
    Ok(())
}

/// Splits an argument list on commas that are not nested inside brackets.
fn split_top_level(args: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in args.char_indices() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(args[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(args[start..].trim());
    parts
}

/// Byte index of the `)` closing the `(` at `open`.
fn matching_paren(s: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in s[open..].char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }
    None
}

/// A declaration as handed over by the source parser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDeclaration {
    pub name: String,
    pub kind: DeclKind,
    pub file: String,
    pub line: u32,
    /// Explicit parameter shape; takes precedence over `argsstring`.
    #[serde(default)]
    pub signature: Option<SignatureShape>,
    /// C argument list as written, e.g. `(int a)`.
    #[serde(default)]
    pub argsstring: Option<String>,
    #[serde(default)]
    pub doc: Option<String>,
}

impl RawDeclaration {
    pub fn into_declaration(self) -> Declaration {
        let signature = self
            .signature
            .or_else(|| self.argsstring.as_deref().map(SignatureShape::from_argsstring));
        let mut decl = Declaration::new(self.name, self.kind, Location::new(self.file, self.line));
        if let Some(sig) = signature {
            decl = decl.with_signature(sig);
        }
        if let Some(doc) = self.doc.as_deref() {
            decl = decl.with_doc_summary(doc);
        }
        decl
    }
}

/// A mention as handed over by the reference extractor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawReference {
    pub text: String,
    pub file: String,
    pub line: u32,
}

impl RawReference {
    pub fn location(&self) -> Location {
        Location::new(self.file.clone(), self.line)
    }
}

/// Everything one documentation batch feeds into the resolver.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchInput {
    #[serde(default)]
    pub declarations: Vec<RawDeclaration>,
    #[serde(default)]
    pub references: Vec<RawReference>,
}

/// Generates a deterministic declaration ID from file path, kind, name, and line number.
///
/// The ID format is `"kind:32hexchars"` where the hex portion is the first 32
/// characters of the SHA-256 hash of the input components.
pub fn generate_decl_id(file_path: &str, kind: &DeclKind, name: &str, line: u32) -> String {
    let input = format!("{}:{}:{}:{}", file_path, kind.as_str(), name, line);
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let hash = hasher.finalize();
    let hex_str = hex::encode(hash);
    format!("{}:{}", kind.as_str(), &hex_str[..32])
}
