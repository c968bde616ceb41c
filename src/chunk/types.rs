/// Token kinds and chunk flags
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Classification of a chunk
///
/// The lexer assigns an initial kind; later passes retype chunks in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TokenKind {
    #[default]
    None,
    Unknown,

    // Whitespace-ish
    Newline,
    NlCont,
    Comment,
    CommentCpp,
    CommentMulti,

    // Identifiers and literals
    Word,
    Type,
    Number,
    NumberFp,
    String,
    Char,

    // Keywords
    If,
    Else,
    ElseIf,
    For,
    While,
    WhileOfDo,
    Do,
    Switch,
    Case,
    Default,
    Return,
    Break,
    Continue,
    Goto,
    Sizeof,
    Struct,
    Union,
    Enum,
    Class,
    Typedef,
    Qualifier,
    Access,
    Namespace,
    Operator,
    OperatorVal,
    New,
    Delete,
    Try,
    Catch,
    Throw,
    Using,

    // Punctuation
    Semicolon,
    VSemicolon,
    Comma,
    Question,
    Dot,
    Member,
    DcMember,
    Ellipsis,

    // Colon roles
    Colon,
    LabelColon,
    CondColon,
    CaseColon,
    BitColon,
    ClassColon,
    AccessColon,
    TagColon,
    ForColon,

    // Grouping
    ParenOpen,
    ParenClose,
    SParenOpen,
    SParenClose,
    FParenOpen,
    FParenClose,
    BraceOpen,
    BraceClose,
    VBraceOpen,
    VBraceClose,
    SquareOpen,
    SquareClose,
    TSquare,

    // Operators
    Assign,
    Arith,
    Compare,
    Bool,
    Not,
    Inv,
    Plus,
    Minus,
    Star,
    Amp,
    Pos,
    Neg,
    Deref,
    Addr,
    PtrType,
    ByRef,
    IncDecBefore,
    IncDecAfter,

    // Preprocessor
    Preproc,
    PpIf,
    PpElse,
    PpEndif,
    PpDefine,
    PpInclude,
    PpPragma,
    PpOther,
    PreprocBody,
    Pound,
    Macro,
    MacroFunc,

    // Semantic retypes
    FuncCall,
    FuncDef,
    FuncProto,
    Label,
    Tag,
    Cast,
    BracedInit,
}

impl TokenKind {
    #[must_use]
    pub fn is_newline(self) -> bool {
        matches!(self, TokenKind::Newline | TokenKind::NlCont)
    }

    #[must_use]
    pub fn is_comment(self) -> bool {
        matches!(
            self,
            TokenKind::Comment | TokenKind::CommentCpp | TokenKind::CommentMulti
        )
    }

    /// Any opening paren flavour
    #[must_use]
    pub fn is_paren_open(self) -> bool {
        matches!(
            self,
            TokenKind::ParenOpen | TokenKind::SParenOpen | TokenKind::FParenOpen
        )
    }

    /// Any closing paren flavour
    #[must_use]
    pub fn is_paren_close(self) -> bool {
        matches!(
            self,
            TokenKind::ParenClose | TokenKind::SParenClose | TokenKind::FParenClose
        )
    }

    #[must_use]
    pub fn is_brace_open(self) -> bool {
        matches!(self, TokenKind::BraceOpen | TokenKind::VBraceOpen)
    }

    #[must_use]
    pub fn is_brace_close(self) -> bool {
        matches!(self, TokenKind::BraceClose | TokenKind::VBraceClose)
    }

    /// Chunks that open a nesting level
    #[must_use]
    pub fn is_opener(self) -> bool {
        self.is_paren_open() || self.is_brace_open() || self == TokenKind::SquareOpen
    }

    /// Chunks that close a nesting level
    #[must_use]
    pub fn is_closer(self) -> bool {
        self.is_paren_close() || self.is_brace_close() || self == TokenKind::SquareClose
    }

    /// The closer that matches this opener
    #[must_use]
    pub fn closer(self) -> Option<TokenKind> {
        match self {
            TokenKind::ParenOpen => Some(TokenKind::ParenClose),
            TokenKind::SParenOpen => Some(TokenKind::SParenClose),
            TokenKind::FParenOpen => Some(TokenKind::FParenClose),
            TokenKind::BraceOpen => Some(TokenKind::BraceClose),
            TokenKind::VBraceOpen => Some(TokenKind::VBraceClose),
            TokenKind::SquareOpen => Some(TokenKind::SquareClose),
            _ => None,
        }
    }

    /// True when both chunks belong to the same bracket family
    #[must_use]
    pub fn pairs_with(self, closer: TokenKind) -> bool {
        (self.is_paren_open() && closer.is_paren_close())
            || (self.is_brace_open() && closer.is_brace_close())
            || (self == TokenKind::SquareOpen && closer == TokenKind::SquareClose)
    }

    /// Colon kinds, classified or not
    #[must_use]
    pub fn is_colon(self) -> bool {
        matches!(
            self,
            TokenKind::Colon
                | TokenKind::LabelColon
                | TokenKind::CondColon
                | TokenKind::CaseColon
                | TokenKind::BitColon
                | TokenKind::ClassColon
                | TokenKind::AccessColon
                | TokenKind::TagColon
                | TokenKind::ForColon
        )
    }

    #[must_use]
    pub fn is_semicolon(self) -> bool {
        matches!(self, TokenKind::Semicolon | TokenKind::VSemicolon)
    }

    #[must_use]
    pub fn is_preproc_directive(self) -> bool {
        matches!(
            self,
            TokenKind::PpIf
                | TokenKind::PpElse
                | TokenKind::PpEndif
                | TokenKind::PpDefine
                | TokenKind::PpInclude
                | TokenKind::PpPragma
                | TokenKind::PpOther
        )
    }

    /// Keywords that introduce a statement with a parenthesised head
    #[must_use]
    pub fn takes_sparen(self) -> bool {
        matches!(
            self,
            TokenKind::If
                | TokenKind::ElseIf
                | TokenKind::For
                | TokenKind::While
                | TokenKind::Switch
                | TokenKind::Catch
        )
    }

    /// Chunks after which an expression has produced a value
    #[must_use]
    pub fn ends_value(self) -> bool {
        matches!(
            self,
            TokenKind::Word
                | TokenKind::Number
                | TokenKind::NumberFp
                | TokenKind::String
                | TokenKind::Char
                | TokenKind::ParenClose
                | TokenKind::FParenClose
                | TokenKind::SquareClose
                | TokenKind::TSquare
                | TokenKind::IncDecAfter
                | TokenKind::Macro
                | TokenKind::FuncCall
        )
    }

    /// Chunks that name a type
    #[must_use]
    pub fn is_type_like(self) -> bool {
        matches!(
            self,
            TokenKind::Type | TokenKind::Qualifier | TokenKind::PtrType | TokenKind::ByRef
        )
    }

    /// Ambiguous operator spellings that the retyper resolves
    #[must_use]
    pub fn is_ambiguous_op(self) -> bool {
        matches!(
            self,
            TokenKind::Plus | TokenKind::Minus | TokenKind::Star | TokenKind::Amp
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::None => "NONE",
            TokenKind::Unknown => "UNKNOWN",
            TokenKind::Newline => "NEWLINE",
            TokenKind::NlCont => "NL_CONT",
            TokenKind::Comment => "COMMENT",
            TokenKind::CommentCpp => "COMMENT_CPP",
            TokenKind::CommentMulti => "COMMENT_MULTI",
            TokenKind::Word => "WORD",
            TokenKind::Type => "TYPE",
            TokenKind::Number => "NUMBER",
            TokenKind::NumberFp => "NUMBER_FP",
            TokenKind::String => "STRING",
            TokenKind::Char => "CHAR",
            TokenKind::If => "IF",
            TokenKind::Else => "ELSE",
            TokenKind::ElseIf => "ELSEIF",
            TokenKind::For => "FOR",
            TokenKind::While => "WHILE",
            TokenKind::WhileOfDo => "WHILE_OF_DO",
            TokenKind::Do => "DO",
            TokenKind::Switch => "SWITCH",
            TokenKind::Case => "CASE",
            TokenKind::Default => "DEFAULT",
            TokenKind::Return => "RETURN",
            TokenKind::Break => "BREAK",
            TokenKind::Continue => "CONTINUE",
            TokenKind::Goto => "GOTO",
            TokenKind::Sizeof => "SIZEOF",
            TokenKind::Struct => "STRUCT",
            TokenKind::Union => "UNION",
            TokenKind::Enum => "ENUM",
            TokenKind::Class => "CLASS",
            TokenKind::Typedef => "TYPEDEF",
            TokenKind::Qualifier => "QUALIFIER",
            TokenKind::Access => "ACCESS",
            TokenKind::Namespace => "NAMESPACE",
            TokenKind::Operator => "OPERATOR",
            TokenKind::OperatorVal => "OPERATOR_VAL",
            TokenKind::New => "NEW",
            TokenKind::Delete => "DELETE",
            TokenKind::Try => "TRY",
            TokenKind::Catch => "CATCH",
            TokenKind::Throw => "THROW",
            TokenKind::Using => "USING",
            TokenKind::Semicolon => "SEMICOLON",
            TokenKind::VSemicolon => "VSEMICOLON",
            TokenKind::Comma => "COMMA",
            TokenKind::Question => "QUESTION",
            TokenKind::Dot => "DOT",
            TokenKind::Member => "MEMBER",
            TokenKind::DcMember => "DC_MEMBER",
            TokenKind::Ellipsis => "ELLIPSIS",
            TokenKind::Colon => "COLON",
            TokenKind::LabelColon => "LABEL_COLON",
            TokenKind::CondColon => "COND_COLON",
            TokenKind::CaseColon => "CASE_COLON",
            TokenKind::BitColon => "BIT_COLON",
            TokenKind::ClassColon => "CLASS_COLON",
            TokenKind::AccessColon => "ACCESS_COLON",
            TokenKind::TagColon => "TAG_COLON",
            TokenKind::ForColon => "FOR_COLON",
            TokenKind::ParenOpen => "PAREN_OPEN",
            TokenKind::ParenClose => "PAREN_CLOSE",
            TokenKind::SParenOpen => "SPAREN_OPEN",
            TokenKind::SParenClose => "SPAREN_CLOSE",
            TokenKind::FParenOpen => "FPAREN_OPEN",
            TokenKind::FParenClose => "FPAREN_CLOSE",
            TokenKind::BraceOpen => "BRACE_OPEN",
            TokenKind::BraceClose => "BRACE_CLOSE",
            TokenKind::VBraceOpen => "VBRACE_OPEN",
            TokenKind::VBraceClose => "VBRACE_CLOSE",
            TokenKind::SquareOpen => "SQUARE_OPEN",
            TokenKind::SquareClose => "SQUARE_CLOSE",
            TokenKind::TSquare => "TSQUARE",
            TokenKind::Assign => "ASSIGN",
            TokenKind::Arith => "ARITH",
            TokenKind::Compare => "COMPARE",
            TokenKind::Bool => "BOOL",
            TokenKind::Not => "NOT",
            TokenKind::Inv => "INV",
            TokenKind::Plus => "PLUS",
            TokenKind::Minus => "MINUS",
            TokenKind::Star => "STAR",
            TokenKind::Amp => "AMP",
            TokenKind::Pos => "POS",
            TokenKind::Neg => "NEG",
            TokenKind::Deref => "DEREF",
            TokenKind::Addr => "ADDR",
            TokenKind::PtrType => "PTR_TYPE",
            TokenKind::ByRef => "BYREF",
            TokenKind::IncDecBefore => "INCDEC_BEFORE",
            TokenKind::IncDecAfter => "INCDEC_AFTER",
            TokenKind::Preproc => "PREPROC",
            TokenKind::PpIf => "PP_IF",
            TokenKind::PpElse => "PP_ELSE",
            TokenKind::PpEndif => "PP_ENDIF",
            TokenKind::PpDefine => "PP_DEFINE",
            TokenKind::PpInclude => "PP_INCLUDE",
            TokenKind::PpPragma => "PP_PRAGMA",
            TokenKind::PpOther => "PP_OTHER",
            TokenKind::PreprocBody => "PREPROC_BODY",
            TokenKind::Pound => "POUND",
            TokenKind::Macro => "MACRO",
            TokenKind::MacroFunc => "MACRO_FUNC",
            TokenKind::FuncCall => "FUNC_CALL",
            TokenKind::FuncDef => "FUNC_DEF",
            TokenKind::FuncProto => "FUNC_PROTO",
            TokenKind::Label => "LABEL",
            TokenKind::Tag => "TAG",
            TokenKind::Cast => "CAST",
            TokenKind::BracedInit => "BRACED_INIT",
        };
        write!(f, "{name}")
    }
}

/// Structural flags carried by a chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ChunkFlags(u32);

impl ChunkFlags {
    pub const NONE: ChunkFlags = ChunkFlags(0);
    /// Part of a preprocessor directive line
    pub const IN_PREPROC: ChunkFlags = ChunkFlags(1 << 0);
    /// Inside a `#if` .. `#endif` region
    pub const IN_PP_BRANCH: ChunkFlags = ChunkFlags(1 << 1);
    /// Synthesised, not present in the source text
    pub const VIRTUAL: ChunkFlags = ChunkFlags(1 << 2);
    /// Result of merging several source tokens
    pub const CONTINUATION: ChunkFlags = ChunkFlags(1 << 3);
    /// Name introduced by a variable definition
    pub const VAR_DEF: ChunkFlags = ChunkFlags(1 << 4);
    /// First significant chunk of a statement
    pub const STMT_START: ChunkFlags = ChunkFlags(1 << 5);
    /// Closer with no matching opener
    pub const UNMATCHED: ChunkFlags = ChunkFlags(1 << 6);
    /// Moved by the alignment engine
    pub const ALIGNED: ChunkFlags = ChunkFlags(1 << 7);
    pub const IN_ENUM: ChunkFlags = ChunkFlags(1 << 8);
    pub const IN_STRUCT: ChunkFlags = ChunkFlags(1 << 9);

    #[must_use]
    pub fn contains(self, other: ChunkFlags) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    #[must_use]
    pub fn intersects(self, other: ChunkFlags) -> bool {
        self.0 & other.0 != 0
    }

    pub fn insert(&mut self, other: ChunkFlags) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: ChunkFlags) {
        self.0 &= !other.0;
    }

    #[must_use]
    pub fn bits(self) -> u32 {
        self.0
    }
}

impl BitOr for ChunkFlags {
    type Output = ChunkFlags;

    fn bitor(self, rhs: ChunkFlags) -> ChunkFlags {
        ChunkFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for ChunkFlags {
    fn bitor_assign(&mut self, rhs: ChunkFlags) {
        self.0 |= rhs.0;
    }
}
