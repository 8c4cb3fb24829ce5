/// Element symbols for atomic numbers 1–118, indexed by `atomic_num - 1`.
static SYMBOLS: [&str; 118] = [
    "H", "He",
    "Li", "Be", "B", "C", "N", "O", "F", "Ne",
    "Na", "Mg", "Al", "Si", "P", "S", "Cl", "Ar",
    "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn",
    "Ga", "Ge", "As", "Se", "Br", "Kr",
    "Rb", "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd",
    "In", "Sn", "Sb", "Te", "I", "Xe",
    "Cs", "Ba",
    "La", "Ce", "Pr", "Nd", "Pm", "Sm", "Eu", "Gd", "Tb", "Dy", "Ho", "Er", "Tm", "Yb",
    "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg",
    "Tl", "Pb", "Bi", "Po", "At", "Rn",
    "Fr", "Ra",
    "Ac", "Th", "Pa", "U", "Np", "Pu", "Am", "Cm", "Bk", "Cf", "Es", "Fm", "Md", "No",
    "Lr", "Rf", "Db", "Sg", "Bh", "Hs", "Mt", "Ds", "Rg", "Cn",
    "Nh", "Fl", "Mc", "Lv", "Ts", "Og",
];

/// Symbols that may be written without brackets.
pub static ORGANIC_SUBSET: [&str; 10] = ["B", "C", "N", "O", "P", "S", "F", "Cl", "Br", "I"];

/// Aromatic symbols accepted outside brackets.
pub static AROMATIC_ORGANIC: [&str; 6] = ["b", "c", "n", "o", "p", "s"];

/// Aromatic symbols accepted inside brackets.
pub static AROMATIC_BRACKET: [&str; 9] = ["se", "as", "te", "b", "c", "n", "o", "p", "s"];

pub fn atomic_num(symbol: &str) -> Option<u8> {
    SYMBOLS
        .iter()
        .position(|s| *s == symbol)
        .map(|i| (i + 1) as u8)
}

pub fn is_element_symbol(symbol: &str) -> bool {
    atomic_num(symbol).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_lookup_exact_match() {
        assert_eq!(atomic_num("He"), Some(2));
        assert_eq!(atomic_num("Fe"), Some(26));
        assert_eq!(atomic_num("Og"), Some(118));
    }

    #[test]
    fn symbol_lookup_case_sensitive() {
        assert_eq!(atomic_num("fe"), None);
        assert_eq!(atomic_num("FE"), None);
        assert!(!is_element_symbol("Xx"));
    }
}
