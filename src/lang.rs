//! Language selection flags.
//!
//! A [`LangFlags`] value selects the dialect-specific lexical rules: keyword
//! sets, string forms, comment nesting and whether a preprocessor exists.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::path::Path;

/// Bit set of target languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LangFlags(pub(crate) u32);

/// File extensions recognised for each language
const EXTENSIONS: &[(&str, LangFlags)] = &[
    ("c", LangFlags::C),
    ("h", LangFlags::C),
    ("cpp", LangFlags::CPP),
    ("cxx", LangFlags::CPP),
    ("cc", LangFlags::CPP),
    ("c++", LangFlags::CPP),
    ("hpp", LangFlags::CPP),
    ("hxx", LangFlags::CPP),
    ("hh", LangFlags::CPP),
    ("d", LangFlags::D),
    ("di", LangFlags::D),
    ("cs", LangFlags::CS),
    ("java", LangFlags::JAVA),
    ("m", LangFlags::OC),
    ("mm", LangFlags::OC_CPP),
    ("vala", LangFlags::VALA),
    ("p", LangFlags::PAWN),
    ("pawn", LangFlags::PAWN),
    ("sma", LangFlags::PAWN),
    ("inc", LangFlags::PAWN),
    ("js", LangFlags::ECMA),
];

impl LangFlags {
    pub const C: LangFlags = LangFlags(1 << 0);
    pub const CPP: LangFlags = LangFlags(1 << 1);
    pub const D: LangFlags = LangFlags(1 << 2);
    pub const CS: LangFlags = LangFlags(1 << 3);
    pub const JAVA: LangFlags = LangFlags(1 << 4);
    pub const OC: LangFlags = LangFlags(1 << 5);
    pub const VALA: LangFlags = LangFlags(1 << 6);
    pub const PAWN: LangFlags = LangFlags(1 << 7);
    pub const ECMA: LangFlags = LangFlags(1 << 8);

    pub const OC_CPP: LangFlags = LangFlags((1 << 5) | (1 << 1));
    /// Every language
    pub const ALL: LangFlags = LangFlags(0x1ff);
    /// Languages that run C-style preprocessor lines through the lexer
    pub const PREPROC: LangFlags = LangFlags((1 << 0) | (1 << 1) | (1 << 3) | (1 << 5) | (1 << 7));

    #[must_use]
    pub fn bits(self) -> u32 {
        self.0
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Whether any of the languages in `other` are selected
    #[must_use]
    pub fn intersects(self, other: LangFlags) -> bool {
        self.0 & other.0 != 0
    }

    #[must_use]
    pub fn has_preprocessor(self) -> bool {
        self.intersects(LangFlags::PREPROC)
    }

    /// Guess the language from a file extension
    #[must_use]
    pub fn from_extension(path: &Path) -> Option<LangFlags> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        EXTENSIONS
            .iter()
            .find(|(e, _)| *e == ext)
            .map(|(_, lang)| *lang)
    }

    /// Parse a language name as used on the command line and in config files
    #[must_use]
    pub fn from_name(name: &str) -> Option<LangFlags> {
        match name.to_ascii_lowercase().as_str() {
            "c" => Some(LangFlags::C),
            "cpp" | "c++" | "cxx" => Some(LangFlags::CPP),
            "d" => Some(LangFlags::D),
            "cs" | "c#" | "csharp" => Some(LangFlags::CS),
            "java" => Some(LangFlags::JAVA),
            "oc" | "objc" | "objective-c" => Some(LangFlags::OC),
            "oc+" | "objc++" => Some(LangFlags::OC_CPP),
            "vala" => Some(LangFlags::VALA),
            "pawn" => Some(LangFlags::PAWN),
            "ecma" | "js" | "javascript" => Some(LangFlags::ECMA),
            _ => None,
        }
    }
}

impl BitOr for LangFlags {
    type Output = LangFlags;

    fn bitor(self, rhs: LangFlags) -> LangFlags {
        LangFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for LangFlags {
    fn bitor_assign(&mut self, rhs: LangFlags) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for LangFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (LangFlags::C, "C"),
            (LangFlags::CPP, "CPP"),
            (LangFlags::D, "D"),
            (LangFlags::CS, "CS"),
            (LangFlags::JAVA, "JAVA"),
            (LangFlags::OC, "OC"),
            (LangFlags::VALA, "VALA"),
            (LangFlags::PAWN, "PAWN"),
            (LangFlags::ECMA, "ECMA"),
        ];
        let selected: Vec<&str> = names
            .iter()
            .filter(|(flag, _)| self.intersects(*flag))
            .map(|(_, name)| *name)
            .collect();
        if selected.is_empty() {
            write!(f, "NONE")
        } else {
            write!(f, "{}", selected.join("|"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_extension() {
        assert_eq!(
            LangFlags::from_extension(Path::new("src/main.c")),
            Some(LangFlags::C)
        );
        assert_eq!(
            LangFlags::from_extension(Path::new("x.HPP")),
            Some(LangFlags::CPP)
        );
        assert_eq!(
            LangFlags::from_extension(Path::new("plugin.sma")),
            Some(LangFlags::PAWN)
        );
        assert_eq!(LangFlags::from_extension(Path::new("README")), None);
        assert_eq!(LangFlags::from_extension(Path::new("a.rs")), None);
    }

    #[test]
    fn test_from_name() {
        assert_eq!(LangFlags::from_name("C++"), Some(LangFlags::CPP));
        assert_eq!(LangFlags::from_name("pawn"), Some(LangFlags::PAWN));
        assert_eq!(LangFlags::from_name("cobol"), None);
    }

    #[test]
    fn test_preprocessor_languages() {
        assert!(LangFlags::C.has_preprocessor());
        assert!(LangFlags::PAWN.has_preprocessor());
        assert!(!LangFlags::JAVA.has_preprocessor());
        assert!(!LangFlags::D.has_preprocessor());
    }

    #[test]
    fn test_display() {
        assert_eq!(LangFlags::OC_CPP.to_string(), "CPP|OC");
        assert_eq!(LangFlags::default().to_string(), "NONE");
    }
}
