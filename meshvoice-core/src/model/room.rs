use rand::Rng;

/// Rooms offered by default clients. Membership itself is plain string
/// equality, so any other name works too.
pub const DEFAULT_ROOMS: [&str; 3] = ["Room A", "Room B", "Room C"];

/// Generated label for participants that did not pick a name.
pub fn guest_name() -> String {
    format!("guest-{}", rand::thread_rng().gen_range(0..1000))
}

/// Trims `requested`, falling back to a guest label when nothing is left.
pub fn resolve_display_name(requested: Option<&str>) -> String {
    match requested.map(str::trim) {
        Some(name) if !name.is_empty() => name.to_owned(),
        _ => guest_name(),
    }
}
