use kernel::id::Id;

pub struct IdentityMarker;
pub type IdentityId = Id<IdentityMarker>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_id_new() {
        let identity_id = IdentityId::new();
        assert_eq!(identity_id.as_uuid().get_version_num(), 4);
    }

    #[test]
    fn test_from_uuid() {
        let uuid = uuid::Uuid::new_v4();
        let identity_id = IdentityId::from_uuid(uuid);
        assert_eq!(identity_id.as_uuid(), &uuid);
    }
}
