use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// Comparison operators a leaf can use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    IsBlank,
    IsNotBlank,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    Between,
    MinLength,
    MaxLength,
    Same,
    NotSame,
    ListInclude,
    ListNotInclude,
    Regex,
}

impl FromStr for Operator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "=" => Ok(Operator::Eq),
            "<>" => Ok(Operator::NotEq),
            "<" => Ok(Operator::Lt),
            "<=" => Ok(Operator::Le),
            ">" => Ok(Operator::Gt),
            ">=" => Ok(Operator::Ge),
            "isblank" => Ok(Operator::IsBlank),
            "isnotblank" => Ok(Operator::IsNotBlank),
            "contains" => Ok(Operator::Contains),
            "notcontains" => Ok(Operator::NotContains),
            "startswith" => Ok(Operator::StartsWith),
            "endswith" => Ok(Operator::EndsWith),
            "between" => Ok(Operator::Between),
            "minlength" => Ok(Operator::MinLength),
            "maxlength" => Ok(Operator::MaxLength),
            "same" => Ok(Operator::Same),
            "notsame" => Ok(Operator::NotSame),
            "listinclude" => Ok(Operator::ListInclude),
            "listnotinclude" => Ok(Operator::ListNotInclude),
            "regex" => Ok(Operator::Regex),
            _ => Err(s.to_string()),
        }
    }
}

impl Operator {
    /// The token stored in filter definitions
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::NotEq => "<>",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::IsBlank => "isblank",
            Operator::IsNotBlank => "isnotblank",
            Operator::Contains => "contains",
            Operator::NotContains => "notcontains",
            Operator::StartsWith => "startswith",
            Operator::EndsWith => "endswith",
            Operator::Between => "between",
            Operator::MinLength => "minlength",
            Operator::MaxLength => "maxlength",
            Operator::Same => "same",
            Operator::NotSame => "notsame",
            Operator::ListInclude => "listinclude",
            Operator::ListNotInclude => "listnotinclude",
            Operator::Regex => "regex",
        }
    }

    /// Negated operators must hold for every element of a multi-value
    /// comparison; the rest hold when any element matches.
    pub fn is_negated(self) -> bool {
        matches!(
            self,
            Operator::NotEq | Operator::NotContains | Operator::NotSame | Operator::ListNotInclude
        )
    }

    /// Operators whose array comparison value is one operand, not a set of
    /// alternatives
    pub fn takes_whole_comparison(self) -> bool {
        matches!(
            self,
            Operator::Between | Operator::Regex | Operator::IsBlank | Operator::IsNotBlank
        )
    }

    /// Operators whose comparison value is compared against the field value,
    /// rather than naming a field, a class or a threshold
    pub fn compares_values(self) -> bool {
        !matches!(
            self,
            Operator::IsBlank
                | Operator::IsNotBlank
                | Operator::MinLength
                | Operator::MaxLength
                | Operator::Same
                | Operator::NotSame
                | Operator::ListInclude
                | Operator::ListNotInclude
                | Operator::Regex
        )
    }

    pub fn is_list(self) -> bool {
        matches!(self, Operator::ListInclude | Operator::ListNotInclude)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed character-class validators selectable by the `regex` operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegexClass {
    HalfNumber,
    HalfAlphabet,
    HalfAlphanumeric,
    HalfAlphanumericSymbol,
    HalfKana,
    HalfWidth,
    FullKana,
    FullWidth,
    Tel,
    Zip,
    Email,
}

static HALF_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+$").expect("valid half number regex"));
static HALF_ALPHABET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]+$").expect("valid half alphabet regex"));
static HALF_ALNUM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9]+$").expect("valid half alphanumeric regex"));
static HALF_ALNUM_SYMBOL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[!-~]+$").expect("valid half alphanumeric symbol regex"));
static HALF_KANA_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\x{FF61}-\x{FF9F} ]+$").expect("valid half kana regex")
});
static HALF_WIDTH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\x{20}-\x{7E}\x{FF61}-\x{FF9F}]+$").expect("valid half width regex")
});
static FULL_KANA_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\x{30A1}-\x{30F6}\x{30FC}\x{3000}]+$").expect("valid full kana regex")
});
static FULL_WIDTH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\x{00}-\x{7F}\x{FF61}-\x{FF9F}]+$").expect("valid full width regex")
});
static TEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:0\d{9,10}|0\d{1,4}-\d{1,4}-\d{3,4})$").expect("valid tel regex")
});
static ZIP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{3}-?\d{4}$").expect("valid zip regex"));
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)+$")
        .expect("valid email regex")
});

impl FromStr for RegexClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "halfnumber" => Ok(RegexClass::HalfNumber),
            "halfalphabet" => Ok(RegexClass::HalfAlphabet),
            "halfalphanumeric" => Ok(RegexClass::HalfAlphanumeric),
            "halfalphanumericsymbol" => Ok(RegexClass::HalfAlphanumericSymbol),
            "halfkana" => Ok(RegexClass::HalfKana),
            "halfwidth" => Ok(RegexClass::HalfWidth),
            "fullkana" => Ok(RegexClass::FullKana),
            "fullwidth" => Ok(RegexClass::FullWidth),
            "tel" => Ok(RegexClass::Tel),
            "zip" => Ok(RegexClass::Zip),
            "email" => Ok(RegexClass::Email),
            _ => Err(s.to_string()),
        }
    }
}

impl RegexClass {
    pub const ALL: [RegexClass; 11] = [
        RegexClass::HalfNumber,
        RegexClass::HalfAlphabet,
        RegexClass::HalfAlphanumeric,
        RegexClass::HalfAlphanumericSymbol,
        RegexClass::HalfKana,
        RegexClass::HalfWidth,
        RegexClass::FullKana,
        RegexClass::FullWidth,
        RegexClass::Tel,
        RegexClass::Zip,
        RegexClass::Email,
    ];

    pub fn id(self) -> &'static str {
        match self {
            RegexClass::HalfNumber => "halfNumber",
            RegexClass::HalfAlphabet => "halfAlphabet",
            RegexClass::HalfAlphanumeric => "halfAlphanumeric",
            RegexClass::HalfAlphanumericSymbol => "halfAlphanumericSymbol",
            RegexClass::HalfKana => "halfKana",
            RegexClass::HalfWidth => "halfWidth",
            RegexClass::FullKana => "fullKana",
            RegexClass::FullWidth => "fullWidth",
            RegexClass::Tel => "tel",
            RegexClass::Zip => "zip",
            RegexClass::Email => "email",
        }
    }

    fn regex(self) -> &'static Regex {
        match self {
            RegexClass::HalfNumber => &HALF_NUMBER_RE,
            RegexClass::HalfAlphabet => &HALF_ALPHABET_RE,
            RegexClass::HalfAlphanumeric => &HALF_ALNUM_RE,
            RegexClass::HalfAlphanumericSymbol => &HALF_ALNUM_SYMBOL_RE,
            RegexClass::HalfKana => &HALF_KANA_RE,
            RegexClass::HalfWidth => &HALF_WIDTH_RE,
            RegexClass::FullKana => &FULL_KANA_RE,
            RegexClass::FullWidth => &FULL_WIDTH_RE,
            RegexClass::Tel => &TEL_RE,
            RegexClass::Zip => &ZIP_RE,
            RegexClass::Email => &EMAIL_RE,
        }
    }

    /// Validate a value; the empty string always passes.
    pub fn is_match(self, text: &str) -> bool {
        text.is_empty() || self.regex().is_match(text)
    }
}
