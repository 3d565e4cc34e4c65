// Read-only lookup tables for state codes.

/// Postal code -> 2-digit FIPS code, for the 50 states, DC and the 5 inhabited territories.
pub const STATE_FIPS: [(&str, &str); 56] = [
    ("AL", "01"),
    ("AK", "02"),
    ("AZ", "04"),
    ("AR", "05"),
    ("CA", "06"),
    ("CO", "08"),
    ("CT", "09"),
    ("DE", "10"),
    ("DC", "11"),
    ("FL", "12"),
    ("GA", "13"),
    ("HI", "15"),
    ("ID", "16"),
    ("IL", "17"),
    ("IN", "18"),
    ("IA", "19"),
    ("KS", "20"),
    ("KY", "21"),
    ("LA", "22"),
    ("ME", "23"),
    ("MD", "24"),
    ("MA", "25"),
    ("MI", "26"),
    ("MN", "27"),
    ("MS", "28"),
    ("MO", "29"),
    ("MT", "30"),
    ("NE", "31"),
    ("NV", "32"),
    ("NH", "33"),
    ("NJ", "34"),
    ("NM", "35"),
    ("NY", "36"),
    ("NC", "37"),
    ("ND", "38"),
    ("OH", "39"),
    ("OK", "40"),
    ("OR", "41"),
    ("PA", "42"),
    ("RI", "44"),
    ("SC", "45"),
    ("SD", "46"),
    ("TN", "47"),
    ("TX", "48"),
    ("UT", "49"),
    ("VT", "50"),
    ("VA", "51"),
    ("WA", "53"),
    ("WV", "54"),
    ("WI", "55"),
    ("WY", "56"),
    ("AS", "60"),
    ("GU", "66"),
    ("MP", "69"),
    ("PR", "72"),
    ("VI", "78"),
];

/// Codes in `STATE_FIPS` that do not elect senators.
const NON_STATES: [&str; 6] = ["DC", "AS", "GU", "MP", "PR", "VI"];

/// The FIPS code of a state or territory, from its postal code (case-insensitive).
pub fn state_fips(postal: &str) -> Option<&'static str> {
    let postal = postal.trim();
    STATE_FIPS
        .iter()
        .find(|(code, _)| code.eq_ignore_ascii_case(postal))
        .map(|(_, fips)| *fips)
}

/// The postal code of a state or territory, from its FIPS code.
pub fn fips_state(fips: &str) -> Option<&'static str> {
    let fips = fips.trim();
    STATE_FIPS
        .iter()
        .find(|(_, f)| *f == fips)
        .map(|(code, _)| *code)
}

/// True for the 50 states that have senators. Expects an upper-case code.
pub fn is_senate_state(postal: &str) -> bool {
    STATE_FIPS.iter().any(|(code, _)| *code == postal) && !NON_STATES.contains(&postal)
}

/// The 50 states, in table order.
pub fn senate_states() -> impl Iterator<Item = &'static str> {
    STATE_FIPS
        .iter()
        .map(|(code, _)| *code)
        .filter(|code| !NON_STATES.contains(code))
}
