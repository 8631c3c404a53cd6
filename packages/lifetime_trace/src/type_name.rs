/// Returns the name of `T` with all module paths removed.
///
/// `alloc::vec::Vec<alloc::string::String>` becomes `Vec<String>`, which is short enough to
/// read in a trace line.
///
/// # Example
///
/// ```rust
/// use lifetime_trace::short_type_name;
///
/// assert_eq!(short_type_name::<Vec<String>>(), "Vec<String>");
/// ```
#[must_use]
pub fn short_type_name<T: ?Sized>() -> String {
    strip_paths(std::any::type_name::<T>())
}

fn is_path_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == ':'
}

fn strip_paths(full: &str) -> String {
    let mut short = String::with_capacity(full.len());
    let mut rest = full;

    while !rest.is_empty() {
        let path_end = rest.find(|c: char| !is_path_char(c)).unwrap_or(rest.len());
        let (path, tail) = rest.split_at(path_end);

        // rsplit always yields at least one item.
        short.push_str(path.rsplit("::").next().unwrap_or(path));

        let separator_end = tail.find(is_path_char).unwrap_or(tail.len());
        let (separator, remaining) = tail.split_at(separator_end);

        short.push_str(separator);
        rest = remaining;
    }

    short
}
