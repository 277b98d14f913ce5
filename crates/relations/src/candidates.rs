use extract::Family;

/// All unordered member pairs of a family, `(m[i], m[j])` for `i < j` over
/// the sorted member set.
pub fn generate_pairs(family: &Family) -> Vec<(String, String)> {
    let members: Vec<&String> = family.members.iter().collect();
    let mut pairs = Vec::with_capacity(members.len() * members.len().saturating_sub(1) / 2);

    for (i, first) in members.iter().enumerate() {
        for second in &members[i + 1..] {
            pairs.push((first.to_string(), second.to_string()));
        }
    }

    pairs
}
