//! Encodings of the explanation problems into CNF formulas.

mod cnf;
pub use cnf::extract_core;
pub use cnf::remove_subsumed_clauses;
pub use cnf::Clause;
pub use cnf::Cnf;

mod prime_implicant_cnf;
pub use prime_implicant_cnf::PrimeImplicantCnf;
