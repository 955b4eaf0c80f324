//! Catalogs for every listable entity.
//!
//! Public column names are camelCase; physical tables and columns are
//! snake_case. Joins listed under `joins` are needed to evaluate a field path
//! and are used by both the count and the page query. Embeds are only joined
//! for the page query.

use super::catalog::{CatalogJoin, Embed, EntityCatalog, JoinKind, TenantScope};

/// Every catalog served by the default registry.
pub static ALL: &[&EntityCatalog] = &[
    &LEAD,
    &USER,
    &USER_GROUP,
    &USER_LOG,
    &PRODUCT,
    &PRODUCT_REVIEW,
    &PROMO,
    &PURCHASE_ORDER,
    &PACKAGE,
    &PICKUP_LOCATION,
    &SHIPMENT,
];

const FULL_ADDRESS: &str = "CONCAT(COALESCE(a.street_address, ''), ' ', \
     COALESCE(a.street_address2, ''), ' ', COALESCE(a.street_address3, ''), ' ', \
     COALESCE(a.city, ''), ' ', COALESCE(a.state, ''), ' ', \
     COALESCE(a.postal_code, ''), ' ', COALESCE(a.country, ''))";

pub static LEAD: EntityCatalog = EntityCatalog {
    entity: "lead",
    table: "lead",
    alias: "l",
    primary_key: "lead_id",
    tenant_scope: TenantScope::Column("client_id"),
    soft_delete: Some("is_deleted"),
    fixed_predicates: &[],
    columns: &[
        ("leadId", "l.lead_id"),
        ("firstName", "l.first_name"),
        ("lastName", "l.last_name"),
        ("email", "l.email"),
        ("phone", "l.phone"),
        ("company", "l.company"),
        ("companySize", "l.company_size"),
        ("title", "l.title"),
        ("leadStatus", "l.lead_status"),
        ("annualRevenue", "l.annual_revenue"),
        ("fax", "l.fax"),
        ("website", "l.website"),
        ("isDeleted", "l.is_deleted"),
        ("clientId", "l.client_id"),
        ("addressId", "l.address_id"),
        ("createdById", "l.created_by_id"),
        ("assignedAgentId", "l.assigned_agent_id"),
        ("createdUser", "l.created_user"),
        ("modifiedUser", "l.modified_user"),
        ("createdAt", "l.created_at"),
        ("updatedAt", "l.updated_at"),
        ("notes", "l.notes"),
        ("address", FULL_ADDRESS),
    ],
    date_columns: &["createdAt", "updatedAt"],
    boolean_columns: &["isDeleted"],
    number_columns: &[
        "leadId",
        "companySize",
        "clientId",
        "addressId",
        "createdById",
        "assignedAgentId",
    ],
    joins: &[CatalogJoin {
        kind: JoinKind::Left,
        table: "address",
        alias: "a",
        on: "a.address_id = l.address_id",
    }],
    embeds: &[
        Embed {
            name: "address",
            table: "address",
            alias: "a",
            on: "a.address_id = l.address_id",
            key: "address_id",
        },
        Embed {
            name: "createdBy",
            table: "app_user",
            alias: "cu",
            on: "cu.user_id = l.created_by_id",
            key: "user_id",
        },
        Embed {
            name: "assignedAgent",
            table: "app_user",
            alias: "aa",
            on: "aa.user_id = l.assigned_agent_id",
            key: "user_id",
        },
    ],
};

pub static USER: EntityCatalog = EntityCatalog {
    entity: "user",
    table: "app_user",
    alias: "u",
    primary_key: "user_id",
    tenant_scope: TenantScope::Mapping {
        table: "user_client_mapping",
        key: "user_id",
        tenant_column: "client_id",
    },
    soft_delete: Some("is_deleted"),
    fixed_predicates: &[],
    columns: &[
        ("userId", "u.user_id"),
        ("firstName", "u.first_name"),
        ("lastName", "u.last_name"),
        ("loginName", "u.login_name"),
        ("role", "u.role"),
        ("dob", "u.dob"),
        ("phone", "u.phone"),
        ("datePasswordChanges", "u.date_password_changes"),
        ("loginAttempts", "u.login_attempts"),
        ("isDeleted", "u.is_deleted"),
        ("locked", "u.locked"),
        ("emailConfirmed", "u.email_confirmed"),
        ("isGuest", "u.is_guest"),
        ("email", "u.email"),
        ("addressId", "u.address_id"),
        ("profilePicture", "u.profile_picture"),
        ("lastLoginAt", "u.last_login_at"),
        ("createdAt", "u.created_at"),
        ("createdUser", "u.created_user"),
        ("updatedAt", "u.updated_at"),
        ("modifiedUser", "u.modified_user"),
        ("notes", "u.notes"),
        ("address", FULL_ADDRESS),
    ],
    date_columns: &[
        "dob",
        "datePasswordChanges",
        "lastLoginAt",
        "createdAt",
        "updatedAt",
    ],
    boolean_columns: &["isDeleted", "locked", "emailConfirmed", "isGuest"],
    number_columns: &["userId", "loginAttempts", "addressId"],
    joins: &[CatalogJoin {
        kind: JoinKind::Left,
        table: "address",
        alias: "a",
        on: "a.address_id = u.address_id",
    }],
    embeds: &[Embed {
        name: "address",
        table: "address",
        alias: "a",
        on: "a.address_id = u.address_id",
        key: "address_id",
    }],
};

pub static USER_GROUP: EntityCatalog = EntityCatalog {
    entity: "user_group",
    table: "user_group",
    alias: "ug",
    primary_key: "group_id",
    tenant_scope: TenantScope::Column("client_id"),
    soft_delete: Some("is_deleted"),
    fixed_predicates: &[],
    columns: &[
        ("groupId", "ug.group_id"),
        ("clientId", "ug.client_id"),
        ("groupName", "ug.group_name"),
        ("description", "ug.description"),
        ("isActive", "ug.is_active"),
        ("isDeleted", "ug.is_deleted"),
        ("notes", "ug.notes"),
        ("createdUser", "ug.created_user"),
        ("modifiedUser", "ug.modified_user"),
        ("createdAt", "ug.created_at"),
        ("updatedAt", "ug.updated_at"),
        ("userCount", MEMBER_COUNT),
        ("memberCount", MEMBER_COUNT),
        ("members", MEMBER_COUNT),
    ],
    date_columns: &["createdAt", "updatedAt"],
    boolean_columns: &["isActive", "isDeleted"],
    number_columns: &["groupId", "clientId", "userCount", "memberCount", "members"],
    joins: &[],
    embeds: &[],
};

const MEMBER_COUNT: &str =
    "(SELECT COUNT(*) FROM user_group_user_map ugm2 WHERE ugm2.group_id = ug.group_id)";

pub static USER_LOG: EntityCatalog = EntityCatalog {
    entity: "user_log",
    table: "user_log",
    alias: "ul",
    primary_key: "log_id",
    tenant_scope: TenantScope::UserWithinTenant {
        user_column: "user_id",
        tenant_column: "client_id",
    },
    soft_delete: None,
    fixed_predicates: &[],
    columns: &[
        ("logId", "ul.log_id"),
        ("userId", "ul.user_id"),
        ("clientId", "ul.client_id"),
        ("action", "ul.action"),
        ("description", "ul.description"),
        ("ipAddress", "ul.ip_address"),
        ("userAgent", "ul.user_agent"),
        ("sessionId", "ul.session_id"),
        ("logLevel", "ul.log_level"),
        ("createdAt", "ul.created_at"),
        ("createdUser", "ul.created_user"),
        ("updatedAt", "ul.updated_at"),
        ("modifiedUser", "ul.modified_user"),
        ("notes", "ul.notes"),
        ("auditUserId", "ul.audit_user_id"),
        ("change", "ul.change"),
        ("newValue", "ul.new_value"),
        ("oldValue", "ul.old_value"),
    ],
    date_columns: &["createdAt", "updatedAt"],
    boolean_columns: &[],
    number_columns: &["logId", "userId", "clientId", "auditUserId"],
    joins: &[],
    embeds: &[],
};

pub static PRODUCT: EntityCatalog = EntityCatalog {
    entity: "product",
    table: "product",
    alias: "p",
    primary_key: "product_id",
    tenant_scope: TenantScope::Column("client_id"),
    soft_delete: Some("is_deleted"),
    fixed_predicates: &[],
    columns: &[
        ("productId", "p.product_id"),
        ("clientId", "p.client_id"),
        ("title", "p.title"),
        ("descriptionHtml", "p.description_html"),
        ("brand", "p.brand"),
        ("color", "p.color"),
        ("colorLabel", "p.color_label"),
        ("condition", "p.condition"),
        ("countryOfManufacture", "p.country_of_manufacture"),
        ("model", "p.model"),
        ("upc", "p.upc"),
        ("modificationHtml", "p.modification_html"),
        ("price", "p.price"),
        ("discount", "p.discount"),
        ("isDiscountPercent", "p.is_discount_percent"),
        ("returnsAllowed", "p.returns_allowed"),
        ("length", "p.length"),
        ("breadth", "p.breadth"),
        ("height", "p.height"),
        ("weightKgs", "p.weight_kgs"),
        ("categoryId", "p.category_id"),
        ("itemModified", "p.item_modified"),
        ("isDeleted", "p.is_deleted"),
        ("notes", "p.notes"),
        ("createdUser", "p.created_user"),
        ("modifiedUser", "p.modified_user"),
        ("createdAt", "p.created_at"),
        ("updatedAt", "p.updated_at"),
        ("pickupLocationId", "pplm.pickup_location_id"),
    ],
    date_columns: &["createdAt", "updatedAt"],
    boolean_columns: &[
        "isDiscountPercent",
        "returnsAllowed",
        "itemModified",
        "isDeleted",
    ],
    number_columns: &[
        "productId",
        "clientId",
        "price",
        "discount",
        "length",
        "breadth",
        "height",
        "weightKgs",
        "categoryId",
        "pickupLocationId",
    ],
    joins: &[CatalogJoin {
        kind: JoinKind::Left,
        table: "product_pickup_location_mapping",
        alias: "pplm",
        on: "pplm.product_id = p.product_id",
    }],
    embeds: &[Embed {
        name: "category",
        table: "product_category",
        alias: "pc",
        on: "pc.category_id = p.category_id",
        key: "category_id",
    }],
};

pub static PRODUCT_REVIEW: EntityCatalog = EntityCatalog {
    entity: "product_review",
    table: "product_review",
    alias: "pr",
    primary_key: "review_id",
    tenant_scope: TenantScope::Parent {
        column: "product_id",
        parent_table: "product",
        parent_key: "product_id",
        tenant_column: "client_id",
    },
    soft_delete: Some("is_deleted"),
    fixed_predicates: &[],
    columns: &[
        ("reviewId", "pr.review_id"),
        ("ratings", "pr.ratings"),
        ("score", "pr.score"),
        ("isDeleted", "pr.is_deleted"),
        ("review", "pr.review"),
        ("userId", "pr.user_id"),
        ("productId", "pr.product_id"),
        ("parentId", "pr.parent_id"),
        ("createdUser", "pr.created_user"),
        ("modifiedUser", "pr.modified_user"),
        ("createdAt", "pr.created_at"),
        ("updatedAt", "pr.updated_at"),
        ("notes", "pr.notes"),
    ],
    date_columns: &["createdAt", "updatedAt"],
    boolean_columns: &["isDeleted"],
    number_columns: &[
        "reviewId",
        "ratings",
        "score",
        "userId",
        "productId",
        "parentId",
    ],
    joins: &[],
    embeds: &[],
};

pub static PROMO: EntityCatalog = EntityCatalog {
    entity: "promo",
    table: "promo",
    alias: "p",
    primary_key: "promo_id",
    tenant_scope: TenantScope::Column("client_id"),
    soft_delete: Some("is_deleted"),
    fixed_predicates: &[],
    columns: &[
        ("promoId", "p.promo_id"),
        ("clientId", "p.client_id"),
        ("promoCode", "p.promo_code"),
        ("description", "p.description"),
        ("discountValue", "p.discount_value"),
        ("isPercent", "p.is_percent"),
        ("isDeleted", "p.is_deleted"),
        ("notes", "p.notes"),
        ("createdUser", "p.created_user"),
        ("modifiedUser", "p.modified_user"),
        ("createdAt", "p.created_at"),
        ("updatedAt", "p.updated_at"),
    ],
    date_columns: &["createdAt", "updatedAt"],
    boolean_columns: &["isPercent", "isDeleted"],
    number_columns: &["promoId", "clientId", "discountValue"],
    joins: &[],
    embeds: &[],
};

pub static PURCHASE_ORDER: EntityCatalog = EntityCatalog {
    entity: "purchase_order",
    table: "purchase_order",
    alias: "po",
    primary_key: "purchase_order_id",
    tenant_scope: TenantScope::Column("client_id"),
    soft_delete: Some("is_deleted"),
    fixed_predicates: &[],
    columns: &[
        ("purchaseOrderId", "po.purchase_order_id"),
        ("clientId", "po.client_id"),
        ("vendorNumber", "po.vendor_number"),
        ("purchaseOrderStatus", "po.purchase_order_status"),
        ("priority", "po.priority"),
        ("expectedDeliveryDate", "po.expected_delivery_date"),
        ("purchaseOrderReceipt", "po.purchase_order_receipt"),
        ("termsConditionsHtml", "po.terms_conditions_html"),
        ("approvedByUserId", "po.approved_by_user_id"),
        ("approvedDate", "po.approved_date"),
        ("rejectedByUserId", "po.rejected_by_user_id"),
        ("rejectedDate", "po.rejected_date"),
        ("isDeleted", "po.is_deleted"),
        ("notes", "po.notes"),
        ("createdUser", "po.created_user"),
        ("modifiedUser", "po.modified_user"),
        ("createdAt", "po.created_at"),
        ("updatedAt", "po.updated_at"),
        (
            "address",
            "(SELECT CONCAT(COALESCE(oa.street_address, ''), ' ', COALESCE(oa.city, ''), ' ', \
             COALESCE(oa.state, ''), ' ', COALESCE(oa.postal_code, ''), ' ', \
             COALESCE(oa.country, '')) FROM order_summary os JOIN address oa \
             ON oa.address_id = os.entity_address_id \
             WHERE os.entity_type = 'PURCHASE_ORDER' AND os.entity_id = po.purchase_order_id \
             LIMIT 1)",
        ),
    ],
    date_columns: &[
        "expectedDeliveryDate",
        "approvedDate",
        "rejectedDate",
        "createdAt",
        "updatedAt",
    ],
    boolean_columns: &["isDeleted"],
    number_columns: &[
        "purchaseOrderId",
        "clientId",
        "approvedByUserId",
        "rejectedByUserId",
    ],
    joins: &[],
    embeds: &[
        Embed {
            name: "approvedBy",
            table: "app_user",
            alias: "abu",
            on: "abu.user_id = po.approved_by_user_id",
            key: "user_id",
        },
        Embed {
            name: "rejectedBy",
            table: "app_user",
            alias: "rbu",
            on: "rbu.user_id = po.rejected_by_user_id",
            key: "user_id",
        },
    ],
};

pub static PACKAGE: EntityCatalog = EntityCatalog {
    entity: "package",
    table: "package",
    alias: "pkg",
    primary_key: "package_id",
    tenant_scope: TenantScope::Column("client_id"),
    soft_delete: Some("is_deleted"),
    fixed_predicates: &[],
    columns: &[
        ("packageId", "pkg.package_id"),
        ("clientId", "pkg.client_id"),
        ("packageName", "pkg.package_name"),
        ("length", "pkg.length"),
        ("breadth", "pkg.breadth"),
        ("height", "pkg.height"),
        ("maxWeight", "pkg.max_weight"),
        ("standardCapacity", "pkg.standard_capacity"),
        ("pricePerUnit", "pkg.price_per_unit"),
        ("packageType", "pkg.package_type"),
        ("isDeleted", "pkg.is_deleted"),
        ("notes", "pkg.notes"),
        ("createdUser", "pkg.created_user"),
        ("modifiedUser", "pkg.modified_user"),
        ("createdAt", "pkg.created_at"),
        ("updatedAt", "pkg.updated_at"),
        (
            "dimensions",
            "CONCAT(pkg.length, ' x ', pkg.breadth, ' x ', pkg.height)",
        ),
        ("pickupLocationId", "pplm.pickup_location_id"),
    ],
    date_columns: &["createdAt", "updatedAt"],
    boolean_columns: &["isDeleted"],
    number_columns: &[
        "packageId",
        "clientId",
        "length",
        "breadth",
        "height",
        "maxWeight",
        "standardCapacity",
        "pricePerUnit",
        "pickupLocationId",
    ],
    joins: &[CatalogJoin {
        kind: JoinKind::Left,
        table: "package_pickup_location_mapping",
        alias: "pplm",
        on: "pplm.package_id = pkg.package_id",
    }],
    embeds: &[],
};

pub static PICKUP_LOCATION: EntityCatalog = EntityCatalog {
    entity: "pickup_location",
    table: "pickup_location",
    alias: "pl",
    primary_key: "pickup_location_id",
    tenant_scope: TenantScope::Column("client_id"),
    soft_delete: Some("is_deleted"),
    fixed_predicates: &[],
    columns: &[
        ("pickupLocationId", "pl.pickup_location_id"),
        ("clientId", "pl.client_id"),
        ("addressNickName", "pl.address_nick_name"),
        ("locationName", "pl.address_nick_name"),
        ("pickupLocationAddressId", "pl.pickup_location_address_id"),
        ("shipRocketPickupLocationId", "pl.ship_rocket_pickup_location_id"),
        ("isDeleted", "pl.is_deleted"),
        ("notes", "pl.notes"),
        ("createdBy", "pl.created_user"),
        ("modifiedBy", "pl.modified_user"),
        ("createdAt", "pl.created_at"),
        ("updatedAt", "pl.updated_at"),
        (
            "address",
            "CONCAT(a.street_address, ' ', a.street_address2, ' ', a.city, ' ', \
             a.state, ' ', a.postal_code)",
        ),
    ],
    date_columns: &["createdAt", "updatedAt"],
    boolean_columns: &["isDeleted"],
    number_columns: &[
        "pickupLocationId",
        "clientId",
        "pickupLocationAddressId",
        "shipRocketPickupLocationId",
    ],
    joins: &[CatalogJoin {
        kind: JoinKind::Inner,
        table: "address",
        alias: "a",
        on: "a.address_id = pl.pickup_location_address_id",
    }],
    embeds: &[Embed {
        name: "address",
        table: "address",
        alias: "a",
        on: "a.address_id = pl.pickup_location_address_id",
        key: "address_id",
    }],
};

pub static SHIPMENT: EntityCatalog = EntityCatalog {
    entity: "shipment",
    table: "shipment",
    alias: "s",
    primary_key: "shipment_id",
    tenant_scope: TenantScope::Column("client_id"),
    soft_delete: None,
    fixed_predicates: &["s.ship_rocket_order_id IS NOT NULL AND s.ship_rocket_order_id <> ''"],
    columns: &[
        ("shipmentId", "s.shipment_id"),
        ("orderSummaryId", "s.order_summary_id"),
        ("pickupLocationId", "s.pickup_location_id"),
        ("totalWeightKgs", "s.total_weight_kgs"),
        ("totalQuantity", "s.total_quantity"),
        ("expectedDeliveryDate", "s.expected_delivery_date"),
        ("packagingCost", "s.packaging_cost"),
        ("shippingCost", "s.shipping_cost"),
        ("totalCost", "s.total_cost"),
        ("selectedCourierCompanyId", "s.selected_courier_company_id"),
        ("selectedCourierName", "s.selected_courier_name"),
        ("selectedCourierRate", "s.selected_courier_rate"),
        ("selectedCourierMinWeight", "s.selected_courier_min_weight"),
        ("shipRocketOrderId", "s.ship_rocket_order_id"),
        ("shipRocketShipmentId", "s.ship_rocket_shipment_id"),
        ("shipRocketAwbCode", "s.ship_rocket_awb_code"),
        ("shipRocketTrackingId", "s.ship_rocket_tracking_id"),
        ("shipRocketStatus", "s.ship_rocket_status"),
        ("clientId", "s.client_id"),
        ("createdUser", "s.created_user"),
        ("modifiedUser", "s.modified_user"),
        ("createdAt", "s.created_at"),
        ("updatedAt", "s.updated_at"),
    ],
    date_columns: &["expectedDeliveryDate", "createdAt", "updatedAt"],
    boolean_columns: &[],
    number_columns: &[
        "shipmentId",
        "orderSummaryId",
        "pickupLocationId",
        "totalWeightKgs",
        "totalQuantity",
        "packagingCost",
        "shippingCost",
        "totalCost",
        "selectedCourierCompanyId",
        "selectedCourierRate",
        "selectedCourierMinWeight",
        "shipRocketShipmentId",
        "clientId",
    ],
    joins: &[],
    embeds: &[Embed {
        name: "pickupLocation",
        table: "pickup_location",
        alias: "pl",
        on: "pl.pickup_location_id = s.pickup_location_id",
        key: "pickup_location_id",
    }],
};

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::filter::types::ColumnType;

    #[test]
    fn entity_keys_are_unique() {
        let mut keys: Vec<_> = ALL.iter().map(|c| c.entity).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), ALL.len());
    }

    #[test]
    fn typed_columns_are_declared() {
        for catalog in ALL {
            for column in catalog
                .date_columns
                .iter()
                .chain(catalog.boolean_columns)
                .chain(catalog.number_columns)
            {
                assert!(
                    catalog.has_column(column),
                    "{}: {column} is typed but not declared",
                    catalog.entity
                );
            }
        }
    }

    #[test]
    fn soft_delete_column_is_boolean_column() {
        for catalog in ALL {
            if let Some(column) = catalog.soft_delete {
                let public = catalog
                    .columns
                    .iter()
                    .find(|(_, path)| *path == format!("{}.{column}", catalog.alias))
                    .map(|(name, _)| *name)
                    .unwrap();
                assert_eq!(catalog.column_type(public), ColumnType::Boolean);
            }
        }
    }

    #[test]
    fn join_aliases_are_referenced_by_columns() {
        for catalog in ALL {
            for join in catalog.joins {
                let prefix = format!("{}.", join.alias);
                assert!(
                    catalog
                        .columns
                        .iter()
                        .any(|(_, path)| path.contains(&prefix)),
                    "{}: join {} is unused",
                    catalog.entity,
                    join.alias
                );
            }
        }
    }

    #[test]
    fn synthetic_columns() {
        assert_eq!(USER_GROUP.column_type("memberCount"), ColumnType::Number);
        assert_eq!(
            USER_GROUP.resolve_field_path("members"),
            USER_GROUP.resolve_field_path("userCount")
        );
        assert_eq!(
            PICKUP_LOCATION.resolve_field_path("locationName"),
            "pl.address_nick_name"
        );
        assert!(
            PACKAGE
                .resolve_field_path("dimensions")
                .contains("' x '")
        );
        assert_eq!(PURCHASE_ORDER.column_type("expectedDeliveryDate"), ColumnType::Date);
    }

    #[test]
    fn shipment_has_no_soft_delete() {
        assert!(SHIPMENT.soft_delete.is_none());
        assert_eq!(SHIPMENT.fixed_predicates.len(), 1);
        assert!(USER_LOG.soft_delete.is_none());
    }

    #[test]
    fn only_user_log_needs_a_user() {
        let scoped: Vec<_> = ALL
            .iter()
            .filter(|c| c.requires_user())
            .map(|c| c.entity)
            .collect();
        assert_eq!(scoped, vec!["user_log"]);
    }
}
