//! Operand and address expressions.

use std::fmt;
use std::str::FromStr;

use crate::Error;
use crate::regs::RegNo;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rtx {
    Reg(RegNo),
    ConstInt(i64),
    /// Reference to a symbol. `local` symbols bind within the current module.
    SymbolRef { name: String, local: bool },
    LabelRef(u32),
    /// Constant expression built from symbols, labels and integers.
    Const(Box<Rtx>),
    Plus(Box<Rtx>, Box<Rtx>),
    PostInc(Box<Rtx>),
    PreDec(Box<Rtx>),
    /// Target-specific expression the generic code cannot look into.
    Unspec(u32),
}

impl Rtx {
    #[must_use]
    pub fn reg(regno: RegNo) -> Self {
        Self::Reg(regno)
    }

    #[must_use]
    pub fn plus(lhs: Self, rhs: Self) -> Self {
        Self::Plus(Box::new(lhs), Box::new(rhs))
    }

    #[must_use]
    pub fn symbol(name: impl Into<String>) -> Self {
        Self::SymbolRef {
            name: name.into(),
            local: false,
        }
    }

    #[must_use]
    pub fn local_symbol(name: impl Into<String>) -> Self {
        Self::SymbolRef {
            name: name.into(),
            local: true,
        }
    }

    #[must_use]
    pub fn constant(inner: Self) -> Self {
        Self::Const(Box::new(inner))
    }

    /// Whether the value of this expression depends on where the code is loaded.
    #[must_use]
    pub fn mentions_symbol_or_label(&self) -> bool {
        match self {
            Self::SymbolRef { .. } | Self::LabelRef(_) => true,
            Self::Const(inner) | Self::PostInc(inner) | Self::PreDec(inner) => {
                inner.mentions_symbol_or_label()
            }
            Self::Plus(lhs, rhs) => lhs.mentions_symbol_or_label() || rhs.mentions_symbol_or_label(),
            Self::Reg(_) | Self::ConstInt(_) | Self::Unspec(_) => false,
        }
    }

    /// Whether the expression contains a node whose meaning is opaque to the backend.
    #[must_use]
    pub fn mentions_unspec(&self) -> bool {
        match self {
            Self::Unspec(_) => true,
            Self::Const(inner) | Self::PostInc(inner) | Self::PreDec(inner) => {
                inner.mentions_unspec()
            }
            Self::Plus(lhs, rhs) => lhs.mentions_unspec() || rhs.mentions_unspec(),
            Self::Reg(_) | Self::ConstInt(_) | Self::SymbolRef { .. } | Self::LabelRef(_) => false,
        }
    }

    /// Whether this is a link-time constant: an integer, symbol, label, or `const` of them.
    #[must_use]
    pub fn is_constant(&self) -> bool {
        match self {
            Self::ConstInt(_) | Self::SymbolRef { .. } | Self::LabelRef(_) => true,
            Self::Const(inner) => inner.is_constant_body(),
            _ => false,
        }
    }

    fn is_constant_body(&self) -> bool {
        match self {
            Self::ConstInt(_) | Self::SymbolRef { .. } | Self::LabelRef(_) => true,
            Self::Plus(lhs, rhs) => lhs.is_constant_body() && rhs.is_constant_body(),
            _ => false,
        }
    }
}

impl fmt::Display for Rtx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reg(r) => write!(f, "{r}"),
            Self::ConstInt(v) => write!(f, "{v}"),
            Self::SymbolRef { name, .. } => write!(f, "@{name}"),
            Self::LabelRef(l) => write!(f, ".L{l}"),
            Self::Const(inner) => write!(f, "const({inner})"),
            Self::Plus(lhs, rhs) => write!(f, "{lhs}+{rhs}"),
            Self::PostInc(inner) => write!(f, "post_inc {inner}"),
            Self::PreDec(inner) => write!(f, "pre_dec {inner}"),
            Self::Unspec(n) => write!(f, "unspec({n})"),
        }
    }
}

/// Parses the textual form printed by `Display`:
/// `sp`, `1024`, `0x40`, `@sym`, `.L3`, `fp+8`, `s0-4`, `a1+a2`, `post_inc s0`, `pre_dec sp`, `unspec(1)`.
impl FromStr for Rtx {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(inner) = s.strip_prefix("post_inc ") {
            return Ok(Self::PostInc(Box::new(parse_term(inner)?)));
        }
        if let Some(inner) = s.strip_prefix("pre_dec ") {
            return Ok(Self::PreDec(Box::new(parse_term(inner)?)));
        }
        if let Some(inner) = s.strip_prefix("const(").and_then(|r| r.strip_suffix(')')) {
            return Ok(match inner.parse()? {
                already @ Self::Const(_) => already,
                other => Self::constant(other),
            });
        }
        // A leading '-' belongs to the first term, not to a binary operator.
        if let Some(pos) = s.char_indices().skip(1).find_map(|(i, c)| (c == '+' || c == '-').then_some(i)) {
            let (lhs, rest) = s.split_at(pos);
            let lhs = parse_term(lhs)?;
            let rhs = if let Some(neg) = rest.strip_prefix('-') {
                match parse_term(neg)? {
                    Self::ConstInt(v) => Self::ConstInt(-v),
                    other => {
                        return Err(Error::Parse {
                            line: 1,
                            message: format!("cannot subtract non-constant '{other}'"),
                        });
                    }
                }
            } else {
                parse_term(&rest[1..])?
            };
            let sum = Self::plus(lhs, rhs);
            // Canonical form wraps symbolic sums in `const`.
            if sum.mentions_symbol_or_label() && sum.is_constant_body() {
                return Ok(Self::constant(sum));
            }
            return Ok(sum);
        }
        parse_term(s)
    }
}

fn parse_term(s: &str) -> crate::Result<Rtx> {
    let s = s.trim();
    if let Some(name) = s.strip_prefix('@') {
        if name.is_empty() {
            return Err(parse_error(s));
        }
        return Ok(match name.strip_suffix(":local") {
            Some(local) => Rtx::local_symbol(local),
            None => Rtx::symbol(name),
        });
    }
    if let Some(label) = s.strip_prefix(".L") {
        return label.parse().map(Rtx::LabelRef).map_err(|_| parse_error(s));
    }
    if let Some(n) = s.strip_prefix("unspec(").and_then(|r| r.strip_suffix(')')) {
        return n.trim().parse().map(Rtx::Unspec).map_err(|_| parse_error(s));
    }
    if let Some(value) = parse_int(s) {
        return Ok(Rtx::ConstInt(value));
    }
    RegNo::from_name(s).map(Rtx::Reg)
}

fn parse_int(s: &str) -> Option<i64> {
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let value = if let Some(hex) = digits.strip_prefix("0x") {
        i64::from_str_radix(hex, 16).ok()?
    } else {
        digits.parse::<i64>().ok()?
    };
    Some(if negative { -value } else { value })
}

fn parse_error(s: &str) -> Error {
    Error::Parse {
        line: 1,
        message: format!("invalid address term '{s}'"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbolic_detection() {
        let addr = Rtx::constant(Rtx::plus(Rtx::symbol("table"), Rtx::ConstInt(4)));
        assert!(addr.mentions_symbol_or_label());
        assert!(addr.is_constant());
        assert!(!Rtx::ConstInt(4).mentions_symbol_or_label());
        assert!(!Rtx::plus(Rtx::reg(RegNo(1)), Rtx::ConstInt(4)).is_constant());
    }

    #[test]
    fn test_display() {
        let addr = Rtx::plus(Rtx::reg(RegNo(15)), Rtx::ConstInt(8));
        assert_eq!(addr.to_string(), "sp+8");
        assert_eq!(Rtx::PostInc(Box::new(Rtx::reg(RegNo(4)))).to_string(), "post_inc s0");
    }

    #[test]
    fn test_parse_addresses() {
        assert_eq!("sp".parse::<Rtx>(), Ok(Rtx::reg(RegNo(15))));
        assert_eq!("0x40".parse::<Rtx>(), Ok(Rtx::ConstInt(64)));
        assert_eq!("-8".parse::<Rtx>(), Ok(Rtx::ConstInt(-8)));
        assert_eq!(
            "fp-12".parse::<Rtx>(),
            Ok(Rtx::plus(Rtx::reg(RegNo(13)), Rtx::ConstInt(-12)))
        );
        assert_eq!(
            "a1 + a2".parse::<Rtx>(),
            Ok(Rtx::plus(Rtx::reg(RegNo(1)), Rtx::reg(RegNo(2))))
        );
        assert_eq!("@counter:local".parse::<Rtx>(), Ok(Rtx::local_symbol("counter")));
        assert_eq!(
            "pre_dec sp".parse::<Rtx>(),
            Ok(Rtx::PreDec(Box::new(Rtx::reg(RegNo(15)))))
        );
        assert_eq!("unspec(3)".parse::<Rtx>(), Ok(Rtx::Unspec(3)));
        assert_eq!(
            "@table+4".parse::<Rtx>(),
            Ok(Rtx::constant(Rtx::plus(Rtx::symbol("table"), Rtx::ConstInt(4))))
        );
        assert!("fp-a1".parse::<Rtx>().is_err());
        assert!("bogus".parse::<Rtx>().is_err());
    }
}
