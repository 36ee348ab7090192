use std::collections::HashMap;

/// Interned word. Two tokens are the same word iff their handles are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Token(u32);

/// Words the assembler itself understands. They are interned first, in this
/// order, so each one has a fixed handle (see the associated consts on `Token`).
const KEYWORDS: [&str; 21] = [
    "export", "def", "set", "zet", "port", "forget", "cmdSet", "page", "grp", ";", "on", "off",
    "=", "=?", "=#", "=:", "{", "}", ":", "\n", "",
];

impl Token {
    pub const EXPORT: Token = Token(0);
    pub const DEF: Token = Token(1);
    pub const SET: Token = Token(2);
    pub const ZET: Token = Token(3);
    pub const PORT: Token = Token(4);
    pub const FORGET: Token = Token(5);
    pub const CMD_SET: Token = Token(6);
    pub const PAGE: Token = Token(7);
    pub const GRP: Token = Token(8);
    pub const COMMENT: Token = Token(9);
    pub const ON: Token = Token(10);
    pub const OFF: Token = Token(11);
    /// Port command, tested (conditional) execution.
    pub const EQ: Token = Token(12);
    /// Port command, unconditional execution.
    pub const EQ_TEST: Token = Token(13);
    /// Immediate command with a literal/symbol value.
    pub const EQ_IMM: Token = Token(14);
    /// Immediate command whose value is a label in the same group.
    pub const EQ_LABEL: Token = Token(15);
    pub const GROUP_START: Token = Token(16);
    pub const GROUP_END: Token = Token(17);
    pub const LABEL_SEP: Token = Token(18);
    pub const NL: Token = Token(19);
    pub const EOF: Token = Token(20);

    pub fn is_line_term(self) -> bool {
        self == Token::NL || self == Token::EOF
    }

    pub fn is_assignment(self) -> bool {
        matches!(self, Token::EQ | Token::EQ_TEST | Token::EQ_IMM | Token::EQ_LABEL)
    }

    /// Keywords that open a top-level statement.
    pub fn is_directive(self) -> bool {
        matches!(
            self,
            Token::EXPORT
                | Token::DEF
                | Token::SET
                | Token::ZET
                | Token::PORT
                | Token::FORGET
                | Token::CMD_SET
                | Token::PAGE
                | Token::GRP
        )
    }

    pub fn index(self) -> u32 {
        self.0
    }
}

#[derive(Debug, Clone)]
pub struct Interner {
    lookup: HashMap<String, Token>,
    words: Vec<String>,
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

impl Interner {
    pub fn new() -> Self {
        let mut int = Self {
            lookup: HashMap::new(),
            words: Vec::new(),
        };
        for kw in KEYWORDS {
            int.intern(kw);
        }
        int
    }

    pub fn intern(&mut self, word: &str) -> Token {
        if let Some(&tok) = self.lookup.get(word) {
            return tok;
        }
        let tok = Token(self.words.len() as u32);
        self.words.push(word.to_owned());
        self.lookup.insert(word.to_owned(), tok);
        tok
    }

    /// Handle of an already interned word, without interning it.
    pub fn get(&self, word: &str) -> Option<Token> {
        self.lookup.get(word).copied()
    }

    pub fn resolve(&self, tok: Token) -> &str {
        &self.words[tok.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}
