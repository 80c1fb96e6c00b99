//! Static relational catalog for the dump conversion.
//!
//! The catalog is the single source of truth for which columns survive
//! filtering, which columns are native text arrays, how dump keys map to
//! entity kinds, in which order tables are emitted, and which embedded
//! collections expand into line-item rows.

use std::collections::{HashMap, HashSet};

/// Column allow-list for one entity kind (relational table).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntitySchema {
    /// Canonical table name, used verbatim as the `INSERT INTO` target.
    pub name: &'static str,
    /// Valid columns, in schema order.
    pub columns: &'static [&'static str],
    /// Columns stored as `text[]` rather than `jsonb`.
    pub array_columns: &'static [&'static str],
}

impl EntitySchema {
    /// Schema with no columns: every field of a row is dropped.
    #[must_use]
    pub const fn empty(name: &'static str) -> Self {
        Self {
            name,
            columns: &[],
            array_columns: &[],
        }
    }

    #[must_use]
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.contains(&column)
    }

    #[must_use]
    pub fn is_array_column(&self, column: &str) -> bool {
        self.array_columns.contains(&column)
    }
}

/// Binds an external dump key (e.g. `"barbers"`) to its entity kind (`"Barber"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableBinding {
    pub dump_key: &'static str,
    pub entity: &'static str,
}

/// A child collection embedded in parent rows that expands into its own
/// statements.
///
/// For every element under `parent.field`, a copy gets `foreign_key` set to
/// the parent's `parent_key` value and is emitted against the `child` schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineItemRelation {
    pub parent: &'static str,
    pub field: &'static str,
    pub child: &'static str,
    pub foreign_key: &'static str,
    pub parent_key: &'static str,
}

/// Result of validating a catalog for internal consistency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    /// The catalog is consistent.
    Valid,
    /// The catalog has one or more inconsistencies.
    Invalid {
        /// Human-readable descriptions of each problem.
        errors: Vec<String>,
    },
}

impl ValidationResult {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

// ---------------------------------------------------------------------------
// Built-in tables
// ---------------------------------------------------------------------------

const fn entity(name: &'static str, columns: &'static [&'static str]) -> EntitySchema {
    EntitySchema {
        name,
        columns,
        array_columns: &[],
    }
}

/// Every entity kind of the application schema.
pub static ENTITIES: &[EntitySchema] = &[
    entity(
        "User",
        &["id", "name", "email", "emailVerified", "image", "password", "role", "createdAt", "updatedAt"],
    ),
    entity(
        "Barber",
        &[
            "id", "name", "phone", "email", "password", "commissionRate", "hourlyRate", "isActive",
            "createdAt", "updatedAt",
        ],
    ),
    entity("Client", &["id", "name", "phone", "email", "createdAt", "updatedAt"]),
    entity(
        "Service",
        &["id", "name", "description", "price", "duration", "isActive", "createdAt", "updatedAt"],
    ),
    entity(
        "Product",
        &[
            "id", "name", "description", "price", "stock", "unit", "category", "isActive", "createdAt",
            "updatedAt",
        ],
    ),
    entity(
        "Appointment",
        &[
            "id",
            "clientId",
            "barberId",
            "date",
            "status",
            "paymentMethod",
            "totalAmount",
            "workedHours",
            "workedHoursSubscription",
            "isSubscriptionAppointment",
            "observations",
            "onlineBookingId",
            "createdAt",
            "updatedAt",
        ],
    ),
    entity("AppointmentService", &["id", "appointmentId", "serviceId", "price", "createdAt"]),
    entity(
        "AppointmentProduct",
        &["id", "appointmentId", "productId", "quantity", "unitPrice", "totalPrice", "createdAt"],
    ),
    entity(
        "Commission",
        &["id", "appointmentId", "barberId", "amount", "status", "paidAt", "createdAt", "updatedAt"],
    ),
    entity(
        "CashRegister",
        &[
            "id",
            "openedBy",
            "openedAt",
            "closedAt",
            "initialAmount",
            "finalAmount",
            "expectedAmount",
            "difference",
            "status",
            "createdAt",
            "updatedAt",
        ],
    ),
    entity(
        "CashMovement",
        &[
            "id", "cashRegisterId", "type", "amount", "description", "category", "paymentMethod",
            "createdAt", "updatedAt",
        ],
    ),
    entity(
        "AccountPayable",
        &[
            "id",
            "description",
            "category",
            "supplier",
            "amount",
            "dueDate",
            "paymentDate",
            "status",
            "paymentMethod",
            "observations",
            "createdAt",
            "updatedAt",
        ],
    ),
    entity(
        "AccountReceivable",
        &[
            "id",
            "description",
            "category",
            "payer",
            "clientId",
            "phone",
            "amount",
            "dueDate",
            "paymentDate",
            "status",
            "paymentMethod",
            "observations",
            "subscriptionId",
            "createdAt",
            "updatedAt",
        ],
    ),
    entity(
        "Subscription",
        &[
            "id",
            "clientId",
            "planName",
            "amount",
            "billingDay",
            "status",
            "startDate",
            "endDate",
            "observations",
            "servicesIncluded",
            "usageLimit",
            "createdAt",
            "updatedAt",
        ],
    ),
    entity(
        "SubscriptionUsage",
        &["id", "subscriptionId", "usedDate", "serviceDetails", "bookingId", "createdAt"],
    ),
    entity(
        "PaymentLink",
        &[
            "id",
            "accountReceivableId",
            "linkUrl",
            "generatedBy",
            "sentAt",
            "expiresAt",
            "status",
            "observations",
            "createdAt",
            "updatedAt",
        ],
    ),
    entity(
        "OnlineBooking",
        &[
            "id",
            "clientId",
            "clientName",
            "clientPhone",
            "clientEmail",
            "serviceId",
            "barberId",
            "scheduledDate",
            "status",
            "isSubscriber",
            "observations",
            "createdAt",
            "updatedAt",
        ],
    ),
    EntitySchema {
        name: "BookingSettings",
        columns: &[
            "id",
            "schedule",
            "serviceIds",
            "barberIds",
            "slotDuration",
            "advanceBookingDays",
            "minimumNotice",
            "createdAt",
            "updatedAt",
        ],
        array_columns: &["serviceIds", "barberIds"],
    },
    entity(
        "ProductSale",
        &[
            "id",
            "productId",
            "quantity",
            "unitPrice",
            "totalAmount",
            "paymentMethod",
            "soldBy",
            "observations",
            "soldAt",
            "createdAt",
            "updatedAt",
        ],
    ),
    entity(
        "ScheduleBlock",
        &["id", "barberId", "date", "startTime", "endTime", "reason", "createdAt", "updatedAt"],
    ),
];

/// Dump tables in emission order. Parents come before the children that
/// reference them.
pub static TABLE_ORDER: &[TableBinding] = &[
    TableBinding { dump_key: "users", entity: "User" },
    TableBinding { dump_key: "barbers", entity: "Barber" },
    TableBinding { dump_key: "clients", entity: "Client" },
    TableBinding { dump_key: "services", entity: "Service" },
    TableBinding { dump_key: "products", entity: "Product" },
    TableBinding { dump_key: "cashRegisters", entity: "CashRegister" },
    TableBinding { dump_key: "cashMovements", entity: "CashMovement" },
    TableBinding { dump_key: "accountsPayable", entity: "AccountPayable" },
    TableBinding { dump_key: "subscriptions", entity: "Subscription" },
    TableBinding { dump_key: "accountsReceivable", entity: "AccountReceivable" },
    TableBinding { dump_key: "subscriptionUsages", entity: "SubscriptionUsage" },
    TableBinding { dump_key: "appointments", entity: "Appointment" },
    TableBinding { dump_key: "commissions", entity: "Commission" },
    TableBinding { dump_key: "paymentLinks", entity: "PaymentLink" },
    TableBinding { dump_key: "onlineBookings", entity: "OnlineBooking" },
    TableBinding { dump_key: "bookingSettings", entity: "BookingSettings" },
    TableBinding { dump_key: "productSales", entity: "ProductSale" },
    TableBinding { dump_key: "scheduleBlocks", entity: "ScheduleBlock" },
];

/// Embedded collections expanded into their own rows.
pub static LINE_ITEMS: &[LineItemRelation] = &[
    LineItemRelation {
        parent: "Appointment",
        field: "services",
        child: "AppointmentService",
        foreign_key: "appointmentId",
        parent_key: "id",
    },
    LineItemRelation {
        parent: "Appointment",
        field: "products",
        child: "AppointmentProduct",
        foreign_key: "appointmentId",
        parent_key: "id",
    },
];

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Lookup structure over entity schemas, table bindings and line-item relations.
///
/// Built once at startup, either from the built-in tables via
/// [`Catalog::builtin`] or from custom tables via [`Catalog::new`].
#[derive(Debug, Clone)]
pub struct Catalog {
    entities: HashMap<&'static str, EntitySchema>,
    tables: Vec<TableBinding>,
    line_items: Vec<LineItemRelation>,
}

impl Catalog {
    /// Creates a catalog from explicit tables. `tables` gives emission order.
    #[must_use]
    pub fn new(
        entities: &[EntitySchema],
        tables: &[TableBinding],
        line_items: &[LineItemRelation],
    ) -> Self {
        Self {
            entities: entities.iter().map(|e| (e.name, *e)).collect(),
            tables: tables.to_vec(),
            line_items: line_items.to_vec(),
        }
    }

    /// The application's built-in catalog.
    #[must_use]
    pub fn builtin() -> Self {
        Self::new(ENTITIES, TABLE_ORDER, LINE_ITEMS)
    }

    /// Table bindings in emission order.
    #[must_use]
    pub fn tables(&self) -> &[TableBinding] {
        &self.tables
    }

    /// Looks up the binding for an external dump key.
    #[must_use]
    pub fn binding(&self, dump_key: &str) -> Option<&TableBinding> {
        self.tables.iter().find(|t| t.dump_key == dump_key)
    }

    #[must_use]
    pub fn entity(&self, name: &str) -> Option<&EntitySchema> {
        self.entities.get(name)
    }

    /// Like [`Catalog::entity`], but an unknown kind yields an empty schema
    /// so that all of its fields are filtered out.
    #[must_use]
    pub fn entity_or_empty(&self, name: &'static str) -> EntitySchema {
        self.entities
            .get(name)
            .copied()
            .unwrap_or(EntitySchema::empty(name))
    }

    /// Line-item relations whose parent is `entity`, in declaration order.
    pub fn line_items_for<'a>(
        &'a self,
        entity: &'a str,
    ) -> impl Iterator<Item = &'a LineItemRelation> + 'a {
        self.line_items.iter().filter(move |r| r.parent == entity)
    }

    /// Checks that dump keys map one-to-one onto known entity kinds and that
    /// every line-item relation refers to known schemas and columns.
    #[must_use]
    pub fn validate(&self) -> ValidationResult {
        let mut errors = Vec::new();
        let mut keys = HashSet::new();
        let mut kinds = HashSet::new();

        for binding in &self.tables {
            if !keys.insert(binding.dump_key) {
                errors.push(format!("dump key `{}` is bound twice", binding.dump_key));
            }
            if !kinds.insert(binding.entity) {
                errors.push(format!("entity `{}` is bound to more than one dump key", binding.entity));
            }
            if !self.entities.contains_key(binding.entity) {
                errors.push(format!(
                    "dump key `{}` maps to unknown entity `{}`",
                    binding.dump_key, binding.entity
                ));
            }
        }

        for schema in self.entities.values() {
            for column in schema.array_columns {
                if !schema.has_column(column) {
                    errors.push(format!(
                        "array column `{}.{column}` is not a column of `{}`",
                        schema.name, schema.name
                    ));
                }
            }
        }

        for relation in &self.line_items {
            match self.entities.get(relation.parent) {
                None => errors.push(format!(
                    "line items `{}.{}` have unknown parent",
                    relation.parent, relation.field
                )),
                Some(parent) if !parent.has_column(relation.parent_key) => errors.push(format!(
                    "parent key `{}` is not a column of `{}`",
                    relation.parent_key, relation.parent
                )),
                Some(_) => {}
            }
            match self.entities.get(relation.child) {
                None => errors.push(format!(
                    "line items `{}.{}` have unknown child `{}`",
                    relation.parent, relation.field, relation.child
                )),
                Some(child) if !child.has_column(relation.foreign_key) => errors.push(format!(
                    "foreign key `{}` is not a column of `{}`",
                    relation.foreign_key, relation.child
                )),
                Some(_) => {}
            }
        }

        if errors.is_empty() {
            ValidationResult::Valid
        } else {
            errors.sort();
            ValidationResult::Invalid { errors }
        }
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}
