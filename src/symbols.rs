use serde::{Deserialize, Serialize};

use crate::intern::Token;

/// Which namespace a binding lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// `def`, `set` and `zet` constants; immediate values and addressing.
    Symbol,
    /// `port` identifiers; command destinations, sources and options.
    Port,
}

impl Scope {
    pub fn name(self) -> &'static str {
        match self {
            Scope::Symbol => "symbol",
            Scope::Port => "port",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    pub name: Token,
    pub value: i32,
    /// Defined while `export on` was in effect.
    pub exported: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Define {
    Added,
    /// The name was already bound; the existing value is kept.
    AlreadyBound(i32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Forgotten {
    pub removed: usize,
    /// The target name was reached and is still bound.
    pub found: bool,
}

/// Stack of bindings for one scope, oldest first.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    entries: Vec<Binding>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, name: Token) -> Option<i32> {
        self.entries
            .iter()
            .rev()
            .find(|b| b.name == name)
            .map(|b| b.value)
    }

    pub fn define(&mut self, name: Token, value: i32, exported: bool) -> Define {
        if let Some(existing) = self.lookup(name) {
            return Define::AlreadyBound(existing);
        }
        self.entries.push(Binding {
            name,
            value,
            exported,
        });
        Define::Added
    }

    /// Binds `names` to consecutive values. Numbering starts at 0 when
    /// `start_at_zero` is set or the table is empty, otherwise one past the
    /// most recently defined value. Names that are already bound keep their
    /// value but still consume a number.
    pub fn sequential_assign(
        &mut self,
        start_at_zero: bool,
        names: &[Token],
        exported: bool,
    ) -> Vec<(Token, i32, Define)> {
        let mut next = match self.last() {
            Some(b) if !start_at_zero => b.value.wrapping_add(1),
            _ => 0,
        };
        let mut out = Vec::with_capacity(names.len());
        for &name in names {
            out.push((name, next, self.define(name, next, exported)));
            next = next.wrapping_add(1);
        }
        out
    }

    /// Drops bindings from the most recent backwards until `target` is the
    /// most recent one, or everything when `target` is `None` or unbound.
    pub fn forget(&mut self, target: Option<Token>) -> Forgotten {
        let keep = target
            .and_then(|t| self.entries.iter().rposition(|b| b.name == t))
            .map_or(0, |idx| idx + 1);
        let removed = self.entries.len() - keep;
        self.entries.truncate(keep);
        Forgotten {
            removed,
            found: keep > 0,
        }
    }

    /// The most recently defined binding.
    pub fn last(&self) -> Option<&Binding> {
        self.entries.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Binding> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Both scopes together.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    symbols: SymbolTable,
    ports: SymbolTable,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&self, scope: Scope) -> &SymbolTable {
        match scope {
            Scope::Symbol => &self.symbols,
            Scope::Port => &self.ports,
        }
    }

    pub fn table_mut(&mut self, scope: Scope) -> &mut SymbolTable {
        match scope {
            Scope::Symbol => &mut self.symbols,
            Scope::Port => &mut self.ports,
        }
    }

    pub fn lookup(&self, scope: Scope, name: Token) -> Option<i32> {
        self.table(scope).lookup(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intern::Interner;

    fn toks(int: &mut Interner, names: &[&str]) -> Vec<Token> {
        names.iter().map(|n| int.intern(n)).collect()
    }

    #[test]
    fn redefinition_keeps_the_first_value() {
        let mut int = Interner::new();
        let x = int.intern("x");
        let mut t = SymbolTable::new();
        assert_eq!(t.define(x, 1, false), Define::Added);
        assert_eq!(t.define(x, 2, false), Define::AlreadyBound(1));
        assert_eq!(t.lookup(x), Some(1));
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn sequential_numbering() {
        let mut int = Interner::new();
        let abc = toks(&mut int, &["a", "b", "c"]);
        let de = toks(&mut int, &["d", "e"]);
        let mut t = SymbolTable::new();

        // continuing on an empty table starts at zero
        t.sequential_assign(false, &de, false);
        assert_eq!(t.lookup(de[0]), Some(0));
        assert_eq!(t.lookup(de[1]), Some(1));

        let mut t = SymbolTable::new();
        t.sequential_assign(true, &abc, false);
        assert_eq!(abc.iter().map(|&n| t.lookup(n)).collect::<Vec<_>>(), [Some(0), Some(1), Some(2)]);
        t.sequential_assign(false, &de, false);
        assert_eq!(t.lookup(de[0]), Some(3));
        assert_eq!(t.lookup(de[1]), Some(4));

        // restarting reuses zero; already bound names are skipped but counted
        let f = int.intern("f");
        let out = t.sequential_assign(true, &[de[0], f], false);
        assert_eq!(out[0], (de[0], 0, Define::AlreadyBound(3)));
        assert_eq!(t.lookup(f), Some(1));
    }

    #[test]
    fn forget_back_to_a_name() {
        let mut int = Interner::new();
        let n = toks(&mut int, &["a", "b", "c", "d"]);
        let mut t = SymbolTable::new();
        for (i, &name) in n.iter().enumerate() {
            t.define(name, i as i32, false);
        }
        let res = t.forget(Some(n[1]));
        assert_eq!(res, Forgotten { removed: 2, found: true });
        assert_eq!(t.lookup(n[0]), Some(0));
        assert_eq!(t.lookup(n[1]), Some(1));
        assert_eq!(t.lookup(n[2]), None);
        assert_eq!(t.lookup(n[3]), None);
    }

    #[test]
    fn forget_everything() {
        let mut int = Interner::new();
        let n = toks(&mut int, &["a", "b", "nope"]);
        let mut t = SymbolTable::new();
        t.define(n[0], 0, false);
        t.define(n[1], 1, false);
        assert_eq!(t.forget(Some(n[2])), Forgotten { removed: 2, found: false });
        assert!(t.is_empty());

        t.define(n[0], 0, false);
        assert_eq!(t.forget(None), Forgotten { removed: 1, found: false });
        assert!(t.is_empty());
    }

    #[test]
    fn scopes_are_independent() {
        let mut int = Interner::new();
        let alu = int.intern("alu");
        let mut reg = Registry::new();
        reg.table_mut(Scope::Port).define(alu, 5, false);
        assert_eq!(reg.lookup(Scope::Port, alu), Some(5));
        assert_eq!(reg.lookup(Scope::Symbol, alu), None);
        reg.table_mut(Scope::Symbol).forget(None);
        assert_eq!(reg.lookup(Scope::Port, alu), Some(5));
    }
}
