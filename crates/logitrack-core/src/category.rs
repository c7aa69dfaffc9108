use std::fmt;

/// Static configuration for one record category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Category {
    /// Short key used on the command line.
    pub key: &'static str,
    pub display_name: &'static str,
    /// Collection endpoint, relative to the server origin.
    pub base_path: &'static str,
    /// Filename used when the backend declares none.
    pub default_filename: &'static str,
    /// Whether a record must carry an attachment at creation.
    pub requires_attachment: bool,
}

pub const SHIPMENTS: Category = Category {
    key: "shipments",
    display_name: "Shipments",
    base_path: "/api/shipments",
    default_filename: "file.xlsx",
    requires_attachment: true,
};

pub const CUSTOMERS: Category = Category {
    key: "customers",
    display_name: "Customers",
    base_path: "/api/customers",
    default_filename: "customer_data.xlsx",
    requires_attachment: false,
};

pub const DISPATCH_OUTPUTS: Category = Category {
    key: "dispatch-outputs",
    display_name: "Dispatch Outputs",
    base_path: "/api/dispatch-outputs",
    default_filename: "file.xlsx",
    requires_attachment: true,
};

pub const DELIVERY_FORWARDS: Category = Category {
    key: "delivery-forwards",
    display_name: "Delivery Forwards",
    base_path: "/api/delivery-forwards",
    default_filename: "file.xlsx",
    requires_attachment: true,
};

pub const ITEM_SNAPSHOTS: Category = Category {
    key: "item-snapshots",
    display_name: "Item Snapshots",
    base_path: "/api/item-snapshots",
    default_filename: "file.xlsx",
    requires_attachment: true,
};

pub const ITEM_ACTIVITY_LOGS: Category = Category {
    key: "item-activity-logs",
    display_name: "Item Activity Logs",
    base_path: "/api/item-activity-logs",
    default_filename: "file.xlsx",
    requires_attachment: true,
};

pub const SUMMARY: Category = Category {
    key: "summary",
    display_name: "Summary",
    base_path: "/api/summary",
    default_filename: "summary_data.xlsx",
    requires_attachment: false,
};

impl Category {
    pub const ALL: &[Category] = &[
        SHIPMENTS,
        CUSTOMERS,
        DISPATCH_OUTPUTS,
        DELIVERY_FORWARDS,
        ITEM_SNAPSHOTS,
        ITEM_ACTIVITY_LOGS,
        SUMMARY,
    ];

    pub fn from_key(key: &str) -> Option<&'static Category> {
        Self::ALL.iter().find(|c| c.key == key)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name)
    }
}
