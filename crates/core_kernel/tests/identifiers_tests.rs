//! Unit tests for the identifiers module

use core_kernel::identifiers::EntityId;
use core_kernel::{
    AddressId, BillId, ChargesId, CustomerAccountId, IconId, MeterPointId, PaymentMethodId,
    UserId,
};
use uuid::Uuid;

mod creation {
    use super::*;

    #[test]
    fn test_new_generates_unique_ids() {
        let id1 = BillId::new();
        let id2 = BillId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_new_v7_generates_time_ordered_ids() {
        let id1 = MeterPointId::new_v7();
        std::thread::sleep(std::time::Duration::from_millis(1));
        let id2 = MeterPointId::new_v7();
        assert!(id1 < id2);
    }

    #[test]
    fn test_from_uuid_preserves_value() {
        let uuid = Uuid::new_v4();
        let id = AddressId::from_uuid(uuid);
        assert_eq!(*id.as_uuid(), uuid);
        assert_eq!(Uuid::from(id), uuid);
    }
}

mod display_and_parsing {
    use super::*;

    #[test]
    fn test_display_carries_prefix() {
        let id = PaymentMethodId::new();
        assert!(id.to_string().starts_with("PM-"));
        assert_eq!(PaymentMethodId::prefix(), "PM");
    }

    #[test]
    fn test_parse_with_and_without_prefix() {
        let id = CustomerAccountId::new();
        let with_prefix: CustomerAccountId = id.to_string().parse().unwrap();
        let bare: CustomerAccountId = id.as_uuid().to_string().parse().unwrap();
        assert_eq!(with_prefix, id);
        assert_eq!(bare, id);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("ACC-not-a-uuid".parse::<CustomerAccountId>().is_err());
    }

    #[test]
    fn test_serde_is_transparent() {
        let id = ChargesId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.as_uuid()));
    }
}

mod entity_names {
    use super::*;

    #[test]
    fn test_table_names() {
        assert_eq!(IconId::ENTITY, "icon_tbl");
        assert_eq!(CustomerAccountId::ENTITY, "customer_account");
        assert_eq!(MeterPointId::ENTITY, "meter_point");
    }

    #[test]
    fn test_user_id_is_external() {
        assert_eq!(UserId::ENTITY, "user");
    }
}
