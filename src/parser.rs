//! Word-level reading and the top-level statement loop.

use crate::assembler::Assembler;
use crate::diag::{Location, Severity};
use crate::image::Coord;
use crate::intern::Token;
use crate::lexer::{Lexeme, Lexer, Pos, MAX_TOKEN_LENGTH};
use crate::symbols::{Define, Scope};
use crate::value::{self, INVALID};

/// Parsing state for one source text.
pub(crate) struct Session<'a, 's> {
    pub(crate) asm: &'a mut Assembler,
    file: &'a str,
    lexer: Lexer<'s>,
    pushed: Option<(Token, Pos)>,
    last_pos: Pos,
}

impl<'a, 's> Session<'a, 's> {
    pub(crate) fn new(asm: &'a mut Assembler, file: &'a str, src: &'s str) -> Self {
        Self {
            asm,
            file,
            lexer: Lexer::new(src),
            pushed: None,
            last_pos: Pos::default(),
        }
    }

    pub(crate) fn run(&mut self) {
        loop {
            let keyword = self.read_word();
            match keyword {
                Token::EOF => break,
                Token::NL => {}
                Token::GRP => self.parse_group(),
                Token::DEF => self.parse_define(Scope::Symbol),
                Token::PORT => self.parse_define(Scope::Port),
                Token::SET => self.parse_sequence(false),
                Token::ZET => self.parse_sequence(true),
                Token::FORGET => self.parse_forget(),
                Token::CMD_SET => self.parse_coordinate(Coord::CmdSet),
                Token::PAGE => self.parse_coordinate(Coord::Page),
                Token::EXPORT => self.parse_export(),
                other => {
                    let msg = format!("unexpected statement keyword: {}", self.display(other));
                    self.abandon_line(msg);
                }
            }
        }
    }

    // ---- words ----

    pub(crate) fn read_word(&mut self) -> Token {
        if let Some((tok, pos)) = self.pushed.take() {
            self.last_pos = pos;
            return tok;
        }
        let lexeme = self.lexer.next_lexeme();
        self.last_pos = self.lexer.token_start();
        match lexeme {
            Lexeme::Newline => Token::NL,
            Lexeme::Eof => Token::EOF,
            Lexeme::Word { text, overlong } => {
                if let Some(full) = overlong {
                    self.error(format!(
                        "Length of token, {full}, exceeds the maximum, {MAX_TOKEN_LENGTH}"
                    ));
                }
                self.asm.interner.intern(text)
            }
        }
    }

    pub(crate) fn peek_word(&mut self) -> Token {
        let tok = self.read_word();
        self.pushed = Some((tok, self.last_pos));
        tok
    }

    pub(crate) fn skip_word_if(&mut self, want: Token) -> bool {
        if self.peek_word() != want {
            return false;
        }
        self.read_word();
        true
    }

    /// Discards the rest of the line, including its newline. End of input is
    /// left for the caller to see.
    pub(crate) fn skip_line(&mut self) {
        loop {
            match self.read_word() {
                Token::NL => return,
                Token::EOF => {
                    self.pushed = Some((Token::EOF, self.last_pos));
                    return;
                }
                _ => {}
            }
        }
    }

    pub(crate) fn expect_line_end(&mut self) {
        match self.peek_word() {
            Token::NL => {
                self.read_word();
            }
            Token::EOF => {}
            other => {
                let msg = format!("Expected new line, found {}", self.display(other));
                self.error(msg);
                self.skip_line();
            }
        }
    }

    // ---- diagnostics ----

    pub(crate) fn last_pos(&self) -> Pos {
        self.last_pos
    }

    pub(crate) fn here(&self) -> Option<Location> {
        self.at(self.last_pos)
    }

    pub(crate) fn at(&self, pos: Pos) -> Option<Location> {
        Some(Location {
            file: self.file.to_owned(),
            pos,
        })
    }

    pub(crate) fn error(&mut self, msg: impl Into<String>) {
        let loc = self.here();
        self.asm.reporter.report(Severity::Error, loc, msg);
    }

    pub(crate) fn error_at(&mut self, pos: Pos, msg: impl Into<String>) {
        let loc = self.at(pos);
        self.asm.reporter.report(Severity::Error, loc, msg);
    }

    /// Reports an error and resynchronises at the next line.
    pub(crate) fn abandon_line(&mut self, msg: impl Into<String>) {
        self.error(msg);
        self.skip_line();
    }

    pub(crate) fn warn(&mut self, msg: impl Into<String>) {
        let loc = self.here();
        self.asm.reporter.report(Severity::Warning, loc, msg);
    }

    pub(crate) fn trace(&mut self, msg: impl Into<String>) {
        let loc = self.here();
        self.asm.reporter.report(Severity::Trace, loc, msg);
    }

    pub(crate) fn tracing(&self) -> bool {
        self.asm.reporter.trace_enabled()
    }

    pub(crate) fn name(&self, tok: Token) -> &str {
        self.asm.interner.resolve(tok)
    }

    pub(crate) fn display(&self, tok: Token) -> String {
        match tok {
            Token::NL => "new line".to_string(),
            Token::EOF => "end of input".to_string(),
            t => self.name(t).to_string(),
        }
    }

    // ---- values ----

    pub(crate) fn resolve(&mut self, scope: Scope, tok: Token) -> i32 {
        let table = self.asm.registry.table(scope);
        match value::resolve(table, &self.asm.interner, tok) {
            Some(v) => v,
            None => {
                let msg = format!("error deriving value for {} {}", scope.name(), self.display(tok));
                self.error(msg);
                INVALID
            }
        }
    }

    fn define(&mut self, scope: Scope, name: Token, value: i32) {
        let exported = self.asm.export;
        let res = self.asm.registry.table_mut(scope).define(name, value, exported);
        let msg = match res {
            Define::Added => format!("added new {}: {} = {}", scope.name(), self.name(name), value),
            Define::AlreadyBound(old) => format!(
                "{} {} is already {}; ignoring new value {}",
                scope.name(),
                self.name(name),
                old,
                value
            ),
        };
        self.trace(msg);
    }

    // ---- statements ----

    /// `def <name> <value>` and `port <name> <value>`.
    fn parse_define(&mut self, scope: Scope) {
        let id = self.read_word();
        if id.is_line_term() {
            self.error(format!("No {} defined", scope.name()));
            return;
        }
        let value = if self.peek_word().is_line_term() {
            let msg = format!("No value for {} {}", scope.name(), self.name(id));
            self.error(msg);
            INVALID
        } else {
            let word = self.read_word();
            self.resolve(scope, word)
        };
        self.define(scope, id, value);
        self.expect_line_end();
    }

    /// `set <names...>` continues numbering, `zet <names...>` restarts at 0.
    fn parse_sequence(&mut self, zero: bool) {
        let mut names = Vec::new();
        loop {
            let word = self.read_word();
            if word.is_line_term() {
                break;
            }
            names.push(word);
        }
        if names.is_empty() {
            self.warn(format!("{} without names", if zero { "zet" } else { "set" }));
            return;
        }
        let exported = self.asm.export;
        let assigned = self
            .asm
            .registry
            .table_mut(Scope::Symbol)
            .sequential_assign(zero, &names, exported);
        if self.tracing() {
            for (name, value, res) in assigned {
                let msg = match res {
                    Define::Added => format!("added new symbol: {} = {}", self.name(name), value),
                    Define::AlreadyBound(old) => format!(
                        "symbol {} is already {}; skipping {}",
                        self.name(name),
                        old,
                        value
                    ),
                };
                self.trace(msg);
            }
        }
    }

    /// `forget [<name>]`: drop symbols defined after `name`, or all of them.
    fn parse_forget(&mut self) {
        let word = self.read_word();
        let target = if word.is_line_term() {
            self.trace("Forgetting all");
            None
        } else {
            self.expect_line_end();
            Some(word)
        };
        let res = self.asm.registry.table_mut(Scope::Symbol).forget(target);
        match target {
            Some(t) if !res.found => {
                let msg = format!(
                    "Failed to find {} so forgot all {} symbols",
                    self.name(t),
                    res.removed
                );
                self.error(msg);
            }
            Some(t) => {
                let msg = format!("Forgot {} symbols to {}", res.removed, self.name(t));
                self.trace(msg);
            }
            None => self.trace(format!("Forgot all {} symbols", res.removed)),
        }
    }

    /// `cmdSet <value>` and `page <value>`.
    fn parse_coordinate(&mut self, coord: Coord) {
        let keyword = match coord {
            Coord::CmdSet => "cmdSet",
            Coord::Page => "page",
            Coord::Group => "grp",
        };
        let word = self.read_word();
        if word.is_line_term() {
            self.error(format!("Expected a value for {keyword}"));
            return;
        }
        let value = self.resolve(Scope::Symbol, word);
        self.trace(format!("{keyword} is:{value}"));
        let geometry = self.asm.config.geometry;
        let value = if geometry.in_range(coord, value as i64) {
            value as u32
        } else {
            self.error(format!(
                "{}, {}, is out of range 0..{}",
                coord.label(),
                value,
                geometry.max(coord)
            ));
            0
        };
        match coord {
            Coord::CmdSet => self.asm.cmd_set = value,
            Coord::Page => self.asm.page = value,
            Coord::Group => {}
        }
        self.expect_line_end();
    }

    /// `export on|off`.
    fn parse_export(&mut self) {
        let state = self.read_word();
        let on = match state {
            Token::ON => true,
            Token::OFF => false,
            _ => {
                self.error("expected on or off for new export state");
                if !state.is_line_term() {
                    self.skip_line();
                }
                return;
            }
        };
        self.expect_line_end();
        self.asm.export = on;
        self.trace(format!("export set to {}", if on { "on" } else { "off" }));
    }
}
