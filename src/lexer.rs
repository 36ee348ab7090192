use serde::Serialize;

/// Words longer than this are reported and truncated.
pub const MAX_TOKEN_LENGTH: usize = 255;

const COMMENT_START: u8 = b';';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pos {
    pub line: u32,
    pub col: u32,
}

impl Default for Pos {
    fn default() -> Self {
        Self { line: 1, col: 1 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lexeme<'s> {
    Newline,
    Eof,
    /// A maximal run of graphic characters. `overlong` holds the full,
    /// untruncated run when it exceeded `MAX_TOKEN_LENGTH`.
    Word {
        text: &'s str,
        overlong: Option<&'s str>,
    },
}

/// Splits source text into words, newlines and end of input.
///
/// Everything that is neither an ASCII graphic character nor a newline is
/// insignificant and separates words. A word starting with `;` opens a comment
/// that runs to the end of the physical line; the lexer swallows it and yields
/// the line terminator instead.
pub struct Lexer<'s> {
    src: &'s str,
    off: usize,
    pos: Pos,
    start: Pos,
}

fn significant(b: u8) -> bool {
    b.is_ascii_graphic() || b == b'\n'
}

impl<'s> Lexer<'s> {
    pub fn new(src: &'s str) -> Self {
        Self {
            src,
            off: 0,
            pos: Pos::default(),
            start: Pos::default(),
        }
    }

    /// Position of the next unread character.
    pub fn pos(&self) -> Pos {
        self.pos
    }

    /// Position where the most recently returned lexeme started.
    pub fn token_start(&self) -> Pos {
        self.start
    }

    fn peek_byte(&self) -> Option<u8> {
        self.src.as_bytes().get(self.off).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek_byte()?;
        self.off += 1;
        if b == b'\n' {
            self.pos.line += 1;
            self.pos.col = 1;
        } else if b & 0xC0 != 0x80 {
            // continuation bytes of a multi-byte char do not advance the column
            self.pos.col += 1;
        }
        Some(b)
    }

    fn skip_while(&mut self, pred: impl Fn(u8) -> bool) {
        while let Some(b) = self.peek_byte() {
            if !pred(b) {
                break;
            }
            self.bump();
        }
    }

    fn raw(&mut self) -> Lexeme<'s> {
        self.skip_while(|b| !significant(b));
        self.start = self.pos;
        match self.peek_byte() {
            None => Lexeme::Eof,
            Some(b'\n') => {
                self.bump();
                Lexeme::Newline
            }
            Some(_) => {
                let begin = self.off;
                self.skip_while(|b| b.is_ascii_graphic());
                let text = &self.src[begin..self.off];
                if text.len() > MAX_TOKEN_LENGTH {
                    Lexeme::Word {
                        text: &text[..MAX_TOKEN_LENGTH],
                        overlong: Some(text),
                    }
                } else {
                    Lexeme::Word {
                        text,
                        overlong: None,
                    }
                }
            }
        }
    }

    pub fn next_lexeme(&mut self) -> Lexeme<'s> {
        match self.raw() {
            Lexeme::Word { text, .. } if text.as_bytes()[0] == COMMENT_START => {
                self.skip_while(|b| b != b'\n');
                self.raw()
            }
            lx => lx,
        }
    }
}
