use crate::normalize::same_fleet;

/// What the engine should do with a device after comparing its current
/// and requested fleet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Send the import call.
    Import,
    /// Already in the requested fleet; nothing to do.
    AlreadyAssigned,
    /// Assigned to another real fleet; never moved automatically.
    Blocked { current_fleet_id: String },
}

/// Apply the fleet-assignment rules, in order:
///
/// 1. no current assignment (or a blank one) → import
/// 2. current == requested → already assigned
/// 3. current == unassigned pool → import
/// 4. anything else → blocked
pub fn decide(current: Option<&str>, requested: &str, unassigned_pool: Option<&str>) -> Decision {
    let current = match current.map(str::trim) {
        Some(c) if !c.is_empty() => c,
        _ => return Decision::Import,
    };

    if same_fleet(current, requested) {
        return Decision::AlreadyAssigned;
    }

    if let Some(pool) = unassigned_pool {
        if same_fleet(current, pool) {
            return Decision::Import;
        }
    }

    Decision::Blocked {
        current_fleet_id: current.to_string(),
    }
}
