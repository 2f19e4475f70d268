const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// Month of the year (1..=12) from a month name; only the first three
/// characters are significant, so "Sept", "september" and "SEP" all match.
pub fn month_of_year(name: &str) -> Option<i32> {
    let key: String = name.trim().chars().take(3).collect::<String>().to_lowercase();
    MONTHS
        .iter()
        .position(|m| *m == key)
        .map(|i| i as i32 + 1)
}
