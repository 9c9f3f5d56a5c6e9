use crate::resource::ResourceId;

/// Directory a preview of `id` is stored under, the first three characters of the id
#[must_use]
pub fn get_shard_hex(id: &ResourceId) -> &str {
	let id = id.as_str();
	id.get(0..3).unwrap_or(id)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn first_three_chars() {
		assert_eq!(get_shard_hex(&ResourceId::from("a1b2c3d4e5f60718")), "a1b");
		assert_eq!(get_shard_hex(&ResourceId::from("ab")), "ab");
	}
}
