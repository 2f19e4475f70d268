use std::ffi::OsString;

use set_date_taken_core::date::month::month_of_year;

/// Repair a command line whose parameters were swallowed into one argument.
///
/// On Windows a quoted folder ending in a backslash (`"C:\Pictures\" 2020 6 1`)
/// escapes the closing quote, so the shell passes everything as a single
/// argument that still contains the `"`. When there is exactly one argument
/// and it contains a quote, the quote becomes the trailing backslash it was
/// meant to follow and the rest is split on whitespace.
pub fn corrected_args<I, T>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut args: Vec<String> = args
        .into_iter()
        .map(|a| a.into().to_string_lossy().into_owned())
        .collect();

    if args.len() != 2 {
        return args;
    }
    let Some(pos) = args[1].find('"') else {
        return args;
    };

    let joined = args.pop().unwrap_or_default();
    args.push(format!("{}\\", &joined[..pos]));
    args.extend(
        joined[pos + 1..]
            .split([' ', '\t'])
            .filter(|t| !t.is_empty())
            .map(str::to_string),
    );
    args
}

/// Month as a number, or as a name such as "Jun" or "june".
pub fn parse_month(s: &str) -> Result<i32, String> {
    if let Ok(n) = s.trim().parse::<i32>() {
        return Ok(n);
    }
    month_of_year(s).ok_or_else(|| format!("{s:?} is neither a month number nor a month name"))
}
