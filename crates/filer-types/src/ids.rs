strong_type! {
    /// Volume number, the part of a file id before the comma.
    VolumeId(u32);
    Uid(u32);
    Gid(u32);
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_volume_id() {
        let id = VolumeId(3);
        assert_eq!(*id, 3u32);
        assert_eq!(format!("{id:?} {id}"), "VolumeId(3) 3");
        assert_eq!("3".parse::<VolumeId>().unwrap(), id);
        assert!(" 3".parse::<VolumeId>().is_err());
        assert_eq!(VolumeId::from(9), VolumeId(9));
    }

    #[test]
    fn test_owner_ids() {
        let json = serde_json::to_string(&(Uid(1000), Gid(100))).unwrap();
        assert_eq!(json, "[1000,100]");
        let (uid, gid): (Uid, Gid) = serde_json::from_str(&json).unwrap();
        assert_eq!((*uid, *gid), (1000, 100));

        let owners: HashSet<Uid> = [Uid(1), Uid(2), Uid(1)].into_iter().collect();
        assert_eq!(owners.len(), 2);
        assert_eq!(Uid::default(), Uid(0));
    }
}
