//! Name lookup shared by the room-based directory methods.

/// Find an item by name: an exact match wins, otherwise the first
/// case-insensitive match.
///
/// The two passes are deliberate. "kitchen" must find the room "Kitchen",
/// but never shadow a room literally named "kitchen".
pub fn match_by_name<'a, T>(
    items: impl IntoIterator<Item = &'a T> + Clone,
    name: &str,
    name_of: impl Fn(&T) -> &str,
) -> Option<&'a T> {
    if let Some(exact) = items.clone().into_iter().find(|item| name_of(item) == name) {
        return Some(exact);
    }
    items
        .into_iter()
        .find(|item| name_of(item).eq_ignore_ascii_case(name))
}
