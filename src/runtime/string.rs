//! Property name interning
//!
//! Every property name the engine sees is interned once into a [`StringTable`]
//! and afterwards handled as an [`Atom`], so property lookup compares integers
//! instead of strings.

use std::fmt;

/// Interned string handle
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Atom(u32);

impl Atom {
    #[inline]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Atom({})", self.0)
    }
}

/// Check if a character is a valid identifier start character
#[inline]
pub fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$' || matches!(c, '\u{C0}'..='\u{D6}' | '\u{D8}'..='\u{F6}' | '\u{F8}'..='\u{FF}')
}

/// Check if a character is a valid identifier continuation character
#[inline]
pub fn is_ident_continue(c: char) -> bool {
    is_ident_start(c) || c.is_ascii_digit() || matches!(c, '\u{300}'..='\u{36F}')
}

/// Check if a whole string is an identifier
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if is_ident_start(c) => chars.all(is_ident_continue),
        _ => false,
    }
}

/// String interning table
///
/// Chained hash table over an append-only string vector. Atoms are never
/// freed; names live as long as the engine.
pub struct StringTable {
    /// Interned strings, indexed by atom
    strings: Vec<Box<str>>,
    /// Chain links (atom index + 1, 0 = end of chain)
    chain: Vec<u32>,
    /// Bucket heads (atom index + 1, 0 = empty)
    hash_table: Vec<u32>,
    /// Mask for hash table indexing
    hash_mask: u32,
}

impl StringTable {
    /// Initial hash table size (power of 2)
    const INITIAL_SIZE: usize = 64;

    /// Create a new string table
    pub fn new() -> Self {
        StringTable {
            strings: Vec::new(),
            chain: Vec::new(),
            hash_table: vec![0; Self::INITIAL_SIZE],
            hash_mask: (Self::INITIAL_SIZE - 1) as u32,
        }
    }

    /// Get the number of interned strings
    #[inline]
    pub fn count(&self) -> usize {
        self.strings.len()
    }

    /// Hash a string for table lookup
    #[inline]
    pub fn hash_string(s: &str) -> u32 {
        let mut h: u32 = 0;
        for b in s.bytes() {
            h = h.wrapping_mul(31).wrapping_add(b as u32);
        }
        h
    }

    /// Find an already interned string
    pub fn lookup(&self, s: &str) -> Option<Atom> {
        let bucket = (Self::hash_string(s) & self.hash_mask) as usize;
        let mut idx = self.hash_table[bucket];
        while idx != 0 {
            let atom = idx - 1;
            if &*self.strings[atom as usize] == s {
                return Some(Atom(atom));
            }
            idx = self.chain[atom as usize];
        }
        None
    }

    /// Intern a string, returning the existing atom if present
    pub fn intern(&mut self, s: &str) -> Atom {
        if let Some(atom) = self.lookup(s) {
            return atom;
        }

        if self.strings.len() + 1 > self.hash_table.len() * 3 / 4 {
            self.resize();
        }

        let atom = self.strings.len() as u32;
        let bucket = (Self::hash_string(s) & self.hash_mask) as usize;
        self.strings.push(s.into());
        self.chain.push(self.hash_table[bucket]);
        self.hash_table[bucket] = atom + 1;
        Atom(atom)
    }

    /// Get the string behind an atom
    pub fn get(&self, atom: Atom) -> &str {
        &self.strings[atom.0 as usize]
    }

    fn resize(&mut self) {
        let new_size = self.hash_table.len() * 2;
        self.hash_table = vec![0; new_size];
        self.hash_mask = (new_size - 1) as u32;

        for (i, s) in self.strings.iter().enumerate() {
            let bucket = (Self::hash_string(s) & self.hash_mask) as usize;
            self.chain[i] = self.hash_table[bucket];
            self.hash_table[bucket] = i as u32 + 1;
        }
    }
}

impl Default for StringTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_ident() {
        assert!(is_ident_start('a'));
        assert!(is_ident_start('Z'));
        assert!(is_ident_start('_'));
        assert!(is_ident_start('$'));
        assert!(is_ident_start('é'));
        assert!(!is_ident_start('0'));
        assert!(!is_ident_start('-'));

        assert!(is_ident_continue('0'));
        assert!(!is_ident_continue('-'));
    }

    #[test]
    fn test_is_identifier() {
        assert!(is_identifier("Point"));
        assert!(is_identifier("_private$1"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("2d"));
        assert!(!is_identifier("my class"));
        assert!(!is_identifier("a.b"));
    }

    #[test]
    fn test_string_hash() {
        let h1 = StringTable::hash_string("hello");
        let h2 = StringTable::hash_string("hello");
        let h3 = StringTable::hash_string("world");

        assert_eq!(h1, h2);
        assert_ne!(h1, h3);
    }

    #[test]
    fn test_intern_dedup() {
        let mut table = StringTable::new();
        let a = table.intern("prototype");
        let b = table.intern("constructor");
        let c = table.intern("prototype");

        assert_eq!(a, c);
        assert_ne!(a, b);
        assert_eq!(table.count(), 2);
        assert_eq!(table.get(b), "constructor");
        assert_eq!(table.lookup("missing"), None);
    }

    #[test]
    fn test_intern_resize() {
        let mut table = StringTable::new();
        let atoms: Vec<_> = (0..500).map(|i| table.intern(&format!("name{}", i))).collect();

        assert_eq!(table.count(), 500);
        for (i, atom) in atoms.iter().enumerate() {
            assert_eq!(table.lookup(&format!("name{}", i)), Some(*atom));
        }
    }
}
