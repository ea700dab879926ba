use crate::transaction::Category;
use rand::Rng;

pub const TOKEN_GROUPS: usize = 4;
pub const TOKEN_GROUP_LEN: usize = 5;
pub const TOKEN_DELIMITER: char = '-';

/// Synthesizes a prepaid electricity delivery token: four 5-digit groups
/// joined by `-`, generated fresh per transaction.
pub fn generate_token() -> String {
    let mut rng = rand::thread_rng();
    let groups: Vec<String> = (0..TOKEN_GROUPS)
        .map(|_| rng.gen_range(10_000..=99_999u32).to_string())
        .collect();
    groups.join(&TOKEN_DELIMITER.to_string())
}

/// Receipt reference number: category code plus ten random digits.
pub fn reference_number(category: Category) -> String {
    let mut rng = rand::thread_rng();
    format!("{}{:010}", category.code(), rng.gen_range(0..10_000_000_000u64))
}
