//! `grp <id> { ... }` blocks: command lines, intra-group labels, listing.

use crate::disasm::{fmt_bits, fmt_word};
use crate::encoding::{Execution, ImmediateCommand, Operand, PortCommand, CMDS_PER_GRP, MAX_OPTIONS};
use crate::image::Coord;
use crate::intern::Token;
use crate::lexer::Pos;
use crate::parser::Session;
use crate::symbols::Scope;

/// One parsed line of a group.
#[derive(Debug, Clone)]
pub(crate) struct Command {
    pub(crate) label: Option<Token>,
    /// Label named by an `=:` source; patched once the group is complete.
    pub(crate) referenced_label: Option<Token>,
    pub(crate) dest: Option<Token>,
    pub(crate) dest_options: Vec<Token>,
    pub(crate) assign: Option<Token>,
    pub(crate) source: Option<Token>,
    pub(crate) source_options: Vec<Token>,
    pub(crate) word: u16,
    pub(crate) pos: Pos,
}

impl Command {
    fn new(pos: Pos) -> Self {
        Self {
            label: None,
            referenced_label: None,
            dest: None,
            dest_options: Vec::new(),
            assign: None,
            source: None,
            source_options: Vec::new(),
            word: 0,
            pos,
        }
    }
}

impl Session<'_, '_> {
    pub(crate) fn parse_group(&mut self) {
        let at = self.here();
        let id_tok = self.read_word();
        if id_tok.is_line_term() {
            self.error("Expected a cmdGrp id");
            return;
        }
        let raw = self.resolve(Scope::Symbol, id_tok);
        let geometry = self.asm.config.geometry;
        let id = if geometry.in_range(Coord::Group, raw as i64) {
            raw as u32
        } else {
            self.error(format!(
                "{}, {}, is out of range 0..{}",
                Coord::Group.label(),
                raw,
                geometry.max(Coord::Group)
            ));
            0
        };

        if self.skip_word_if(Token::GROUP_START) {
            self.expect_line_end();
        } else {
            let found = self.peek_word();
            let msg = format!("expected {{ to start a command group, found {}", self.display(found));
            self.abandon_line(msg);
        }

        let (cs, pg) = (self.asm.cmd_set, self.asm.page);
        if self.tracing() {
            let addr = geometry.address(cs, pg, id);
            let msg = format!("cmdGrp: {} {cs}:{pg}:{id}[{addr:#06x}]", self.display(id_tok));
            self.trace(msg);
        }

        let mut cmds: Vec<Command> = Vec::with_capacity(CMDS_PER_GRP);
        let closed = loop {
            match self.peek_word() {
                Token::NL => {
                    self.read_word();
                }
                Token::GROUP_END => {
                    self.read_word();
                    break true;
                }
                Token::EOF => break false,
                t if t.is_directive() => break false,
                _ if cmds.len() == CMDS_PER_GRP => break false,
                _ => {
                    let cmd = self.parse_command();
                    cmds.push(cmd);
                }
            }
        };
        if closed {
            self.expect_line_end();
        } else {
            self.error("expected command group to terminate with }");
        }

        self.resolve_labels(&mut cmds);

        let mut words = [0u16; CMDS_PER_GRP];
        for (slot, cmd) in words.iter_mut().zip(&cmds) {
            *slot = cmd.word;
        }
        if self.tracing() {
            for cmd in &cmds {
                let line = self.listing(cmd);
                self.trace(line);
            }
        }
        self.asm.write_group(cs, pg, id, &words, at);
    }

    /// Points each `=:` command at the slot of the first command carrying
    /// the referenced label.
    fn resolve_labels(&mut self, cmds: &mut [Command]) {
        let layout = self.asm.layout;
        for i in 0..cmds.len() {
            let Some(target) = cmds[i].referenced_label else {
                continue;
            };
            match cmds.iter().position(|c| c.label == Some(target)) {
                Some(idx) => cmds[i].word = layout.patch_label(cmds[i].word, idx),
                None => {
                    let msg = format!("referenced label, {}, not found", self.name(target));
                    self.error_at(cmds[i].pos, msg);
                }
            }
        }
    }

    /// Parses one command line. The slot is used even when the line has
    /// errors; whatever was encoded so far stays in the word.
    fn parse_command(&mut self) -> Command {
        let first = self.read_word();
        let mut cmd = Command::new(self.last_pos());

        let mut dest = first;
        if self.skip_word_if(Token::LABEL_SEP) {
            cmd.label = Some(first);
            dest = self.read_word();
        } else if let Some(label) = self.name(first).strip_suffix(':').filter(|l| !l.is_empty()) {
            let label = label.to_owned();
            cmd.label = Some(self.asm.interner.intern(&label));
            dest = self.read_word();
        }
        if dest.is_line_term() || dest.is_assignment() {
            let msg = format!("expected a destination, found {}", self.display(dest));
            self.error(msg);
            if !dest.is_line_term() {
                self.skip_line();
            }
            return cmd;
        }
        cmd.dest = Some(dest);

        let assign = loop {
            let word = self.read_word();
            if word.is_assignment() {
                break word;
            }
            if word.is_line_term() {
                self.error("expected an assignment operator before the end of the line");
                return cmd;
            }
            if cmd.dest_options.len() == MAX_OPTIONS {
                let msg = format!(
                    "too many destination options at {}; at most {MAX_OPTIONS} are allowed",
                    self.display(word)
                );
                self.abandon_line(msg);
                return cmd;
            }
            cmd.dest_options.push(word);
        };
        cmd.assign = Some(assign);
        let dest = self.operand(dest, &cmd.dest_options);

        let source = self.read_word();
        if source.is_line_term() {
            let msg = format!("expected a source after {}", self.display(assign));
            self.error(msg);
            return cmd;
        }
        cmd.source = Some(source);

        let layout = self.asm.layout;
        match assign {
            Token::EQ_IMM => {
                let value = self.resolve(Scope::Symbol, source) as u16;
                cmd.word = layout.encode_immediate(&ImmediateCommand { dest, value });
                self.expect_line_end();
            }
            Token::EQ_LABEL => {
                cmd.referenced_label = Some(source);
                cmd.word = layout.encode_immediate(&ImmediateCommand { dest, value: 0 });
                self.expect_line_end();
            }
            _ => {
                let execution = if assign == Token::EQ_TEST {
                    Execution::Unconditional
                } else {
                    Execution::Tested
                };
                loop {
                    let word = self.read_word();
                    if word.is_line_term() {
                        break;
                    }
                    if cmd.source_options.len() == MAX_OPTIONS {
                        let msg = format!(
                            "too many source options at {}; at most {MAX_OPTIONS} are allowed",
                            self.display(word)
                        );
                        self.abandon_line(msg);
                        break;
                    }
                    cmd.source_options.push(word);
                }
                let source = self.operand(source, &cmd.source_options);
                cmd.word = layout.encode_port(&PortCommand {
                    dest,
                    execution,
                    source,
                });
            }
        }
        cmd
    }

    fn operand(&mut self, port: Token, options: &[Token]) -> Operand {
        let port = self.resolve(Scope::Port, port) as u16;
        let options = options
            .iter()
            .fold(0u16, |acc, &opt| acc | self.resolve(Scope::Port, opt) as u16);
        Operand::new(port, options)
    }

    /// `0x8302 / 0b1_0000_011_0_0000_010  x: a = b   [3 = 2]`
    fn listing(&self, cmd: &Command) -> String {
        let layout = self.asm.layout;
        let bits = fmt_bits(cmd.word, layout.field_widths(layout.kind(cmd.word)));
        let mut text = String::new();
        if let Some(label) = cmd.label {
            text.push_str(self.name(label));
            text.push_str(": ");
        }
        let words = cmd
            .dest
            .iter()
            .chain(&cmd.dest_options)
            .chain(&cmd.assign)
            .chain(&cmd.source)
            .chain(&cmd.source_options);
        let parts: Vec<&str> = words.map(|&t| self.name(t)).collect();
        text.push_str(&parts.join(" "));
        format!(
            "{:#06x} / {bits}  {text:<32} [{}]",
            cmd.word,
            fmt_word(layout, cmd.word)
        )
    }
}
