//! Statement emission.
//!
//! Walks the catalog's table order once, filtering each row down to its
//! entity's columns, encoding the surviving values, and expanding embedded
//! line items into their own statements right after the parent's.

use std::collections::BTreeMap;
use std::fmt;

use crate::dump::Dump;
use crate::encode::encode_value;
use crate::error::ConvertError;
use crate::schema::{Catalog, EntitySchema, TableBinding};
use crate::types::{Row, Value};

// ---------------------------------------------------------------------------
// Statement
// ---------------------------------------------------------------------------

/// One `INSERT` statement: target entity plus ordered `(column, literal)` pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub entity: &'static str,
    pub columns: Vec<(String, String)>,
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "INSERT INTO \"{}\" (", self.entity)?;
        for (i, (column, _)) in self.columns.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "\"{column}\"")?;
        }
        f.write_str(") VALUES (")?;
        for (i, (_, literal)) in self.columns.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(literal)?;
        }
        f.write_str(");")
    }
}

// ---------------------------------------------------------------------------
// Schema filter
// ---------------------------------------------------------------------------

/// Fields of a row that survived schema filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredRow<'a> {
    /// Kept `(column, value)` pairs in the row's own key order.
    pub fields: Vec<(&'a str, &'a Value)>,
    /// Number of fields removed because the schema does not know them.
    pub dropped: usize,
}

/// Keeps the fields of `row` that are columns of `schema`, in row order.
#[must_use]
pub fn filter_row<'a>(row: &'a Row, schema: &EntitySchema) -> FilteredRow<'a> {
    let fields: Vec<(&str, &Value)> = row.iter().filter(|(k, _)| schema.has_column(k)).collect();
    let dropped = row.len() - fields.len();
    FilteredRow { fields, dropped }
}

/// Encodes a filtered row. `None` when no column survived.
#[must_use]
pub fn build_statement(filtered: &FilteredRow<'_>, schema: &EntitySchema) -> Option<Statement> {
    if filtered.fields.is_empty() {
        return None;
    }
    let columns = filtered
        .fields
        .iter()
        .map(|(column, value)| {
            let literal = encode_value(value, schema.is_array_column(column));
            ((*column).to_string(), literal)
        })
        .collect();
    Some(Statement {
        entity: schema.name,
        columns,
    })
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Counts of everything the conversion silently left out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConvertReport {
    /// Dump keys that were converted, in emission order.
    pub tables_converted: Vec<String>,
    /// Dump keys with no binding in the catalog.
    pub tables_skipped: Vec<String>,
    /// Rows (parents or line items) where every field was filtered out.
    pub rows_without_columns: usize,
    /// Fields removed by schema filtering, per entity kind.
    pub fields_dropped: BTreeMap<&'static str, usize>,
    /// Line-item elements that were not objects.
    pub line_items_skipped: usize,
    /// Statements emitted.
    pub statements: usize,
}

impl ConvertReport {
    #[must_use]
    pub fn total_fields_dropped(&self) -> usize {
        self.fields_dropped.values().sum()
    }
}

/// Output of a conversion run.
#[derive(Debug, Clone, Default)]
pub struct Conversion {
    pub statements: Vec<Statement>,
    pub report: ConvertReport,
}

// ---------------------------------------------------------------------------
// Emitter
// ---------------------------------------------------------------------------

/// Single forward pass over a dump, producing statements in
/// (table order, row order, line-item order).
pub struct Emitter<'c> {
    catalog: &'c Catalog,
    statements: Vec<Statement>,
    report: ConvertReport,
}

impl<'c> Emitter<'c> {
    #[must_use]
    pub fn new(catalog: &'c Catalog) -> Self {
        Self {
            catalog,
            statements: Vec::new(),
            report: ConvertReport::default(),
        }
    }

    /// Converts the whole dump.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::MissingParentKey`] when a row carries line
    /// items but not the key they must reference.
    pub fn emit(mut self, dump: &Dump) -> Result<Conversion, ConvertError> {
        let catalog = self.catalog;

        for key in dump.table_keys() {
            if catalog.binding(key).is_none() {
                tracing::warn!(table = %key, "Dump table not in catalog; skipped");
                self.report.tables_skipped.push(key.to_string());
            }
        }

        for binding in catalog.tables() {
            let Some(table) = dump.table(binding.dump_key) else {
                continue;
            };
            let rows = table.rows();
            if rows.is_empty() {
                tracing::debug!(table = binding.dump_key, "Empty table; skipped");
                continue;
            }
            self.emit_table(binding, rows)?;
        }

        self.report.statements = self.statements.len();
        Ok(Conversion {
            statements: self.statements,
            report: self.report,
        })
    }

    fn emit_table(&mut self, binding: &TableBinding, rows: &[Row]) -> Result<(), ConvertError> {
        let schema = self.catalog.entity_or_empty(binding.entity);
        let first = self.statements.len();

        for (index, row) in rows.iter().enumerate() {
            self.push_row(&schema, row);
            self.expand_line_items(&schema, row, index)?;
        }

        tracing::debug!(
            table = binding.dump_key,
            entity = binding.entity,
            rows = rows.len(),
            statements = self.statements.len() - first,
            "Converted table"
        );
        self.report.tables_converted.push(binding.dump_key.to_string());
        Ok(())
    }

    fn push_row(&mut self, schema: &EntitySchema, row: &Row) {
        let filtered = filter_row(row, schema);
        if filtered.dropped > 0 {
            *self.report.fields_dropped.entry(schema.name).or_default() += filtered.dropped;
        }
        match build_statement(&filtered, schema) {
            Some(statement) => self.statements.push(statement),
            None => self.report.rows_without_columns += 1,
        }
    }

    fn expand_line_items(
        &mut self,
        parent: &EntitySchema,
        row: &Row,
        index: usize,
    ) -> Result<(), ConvertError> {
        let catalog = self.catalog;

        for relation in catalog.line_items_for(parent.name) {
            let Some(Value::Array(items)) = row.get(relation.field) else {
                continue;
            };
            if items.is_empty() {
                continue;
            }
            let parent_key = row
                .get(relation.parent_key)
                .ok_or(ConvertError::MissingParentKey {
                    entity: relation.parent,
                    field: relation.field,
                    parent_key: relation.parent_key,
                    row: index,
                })?;
            let child = catalog.entity_or_empty(relation.child);

            for item in items {
                let Value::Object(fields) = item else {
                    tracing::warn!(
                        entity = relation.parent,
                        field = relation.field,
                        row = index,
                        "Line item is not an object; skipped"
                    );
                    self.report.line_items_skipped += 1;
                    continue;
                };
                let mut child_row: Row = fields.iter().cloned().collect();
                child_row.set(relation.foreign_key, parent_key.clone());
                self.push_row(&child, &child_row);
            }
        }
        Ok(())
    }
}

/// Converts `dump` against `catalog` in one pass.
///
/// # Errors
///
/// See [`Emitter::emit`].
pub fn convert(dump: &Dump, catalog: &Catalog) -> Result<Conversion, ConvertError> {
    Emitter::new(catalog).emit(dump)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::schema::LineItemRelation;

    fn run(json: &str) -> Conversion {
        convert(&Dump::from_json(json).unwrap(), &Catalog::builtin()).unwrap()
    }

    fn lines(conversion: &Conversion) -> Vec<String> {
        conversion.statements.iter().map(ToString::to_string).collect()
    }

    // ---- Scenarios ----

    #[test]
    fn unknown_field_is_dropped() {
        let out = run(r#"{"tables": {"barbers": {"data": [{"id": "b1", "name": "Jo", "extra": "drop-me"}]}}}"#);
        assert_eq!(lines(&out), vec![r#"INSERT INTO "Barber" ("id", "name") VALUES ('b1', 'Jo');"#]);
        assert_eq!(out.report.fields_dropped.get("Barber"), Some(&1));
    }

    #[test]
    fn appointment_services_follow_their_parent() {
        let out = run(
            r#"{"tables": {"appointments": {"data": [
                {"id": "a1", "status": "DONE", "services": [{"serviceId": "s1", "price": 10}]}
            ]}}}"#,
        );
        assert_eq!(
            lines(&out),
            vec![
                r#"INSERT INTO "Appointment" ("id", "status") VALUES ('a1', 'DONE');"#,
                r#"INSERT INTO "AppointmentService" ("serviceId", "price", "appointmentId") VALUES ('s1', 10, 'a1');"#,
            ]
        );
    }

    #[test]
    fn row_with_no_known_field_emits_nothing() {
        let out = run(r#"{"tables": {"clients": {"data": [{"foo": 1, "bar": "x"}]}}}"#);
        assert!(out.statements.is_empty());
        assert_eq!(out.report.rows_without_columns, 1);
        assert_eq!(out.report.fields_dropped.get("Client"), Some(&2));
    }

    // ---- Ordering ----

    #[test]
    fn tables_follow_catalog_order_not_document_order() {
        let out = run(
            r#"{"tables": {
                "appointments": {"data": [{"id": "a1"}]},
                "users": {"data": [{"id": "u1"}]},
                "barbers": {"data": [{"id": "b1"}, {"id": "b2"}]}
            }}"#,
        );
        let entities: Vec<&str> = out.statements.iter().map(|s| s.entity).collect();
        assert_eq!(entities, vec!["User", "Barber", "Barber", "Appointment"]);
        assert_eq!(out.statements[1].columns[0].1, "'b1'");
        assert_eq!(out.statements[2].columns[0].1, "'b2'");
        assert_eq!(out.report.tables_converted, vec!["users", "barbers", "appointments"]);
    }

    #[test]
    fn line_items_keep_their_order_and_precede_next_parent() {
        let out = run(
            r#"{"tables": {"appointments": {"data": [
                {"id": "a1",
                 "services": [{"id": "as1"}, {"id": "as2"}],
                 "products": [{"id": "ap1", "quantity": 2}]},
                {"id": "a2"}
            ]}}}"#,
        );
        let targets: Vec<(&str, &str)> = out
            .statements
            .iter()
            .map(|s| (s.entity, s.columns[0].1.as_str()))
            .collect();
        assert_eq!(
            targets,
            vec![
                ("Appointment", "'a1'"),
                ("AppointmentService", "'as1'"),
                ("AppointmentService", "'as2'"),
                ("AppointmentProduct", "'ap1'"),
                ("Appointment", "'a2'"),
            ]
        );
    }

    #[test]
    fn line_items_are_filtered_against_child_schema() {
        let out = run(
            r#"{"tables": {"appointments": {"data": [
                {"id": "a1", "products": [{"productId": "p1", "product": {"name": "Wax"}, "quantity": 1}]}
            ]}}}"#,
        );
        assert_eq!(
            out.statements[1].to_string(),
            r#"INSERT INTO "AppointmentProduct" ("productId", "quantity", "appointmentId") VALUES ('p1', 1, 'a1');"#
        );
        assert_eq!(out.report.fields_dropped.get("AppointmentProduct"), Some(&1));
        // `services`/`products` never reach the parent statement.
        assert_eq!(out.report.fields_dropped.get("Appointment"), Some(&1));
    }

    #[test]
    fn existing_foreign_key_is_overwritten_in_place() {
        let out = run(
            r#"{"tables": {"appointments": {"data": [
                {"id": "a1", "services": [{"appointmentId": "stale", "serviceId": "s1"}]}
            ]}}}"#,
        );
        assert_eq!(
            out.statements[1].to_string(),
            r#"INSERT INTO "AppointmentService" ("appointmentId", "serviceId") VALUES ('a1', 's1');"#
        );
    }

    // ---- Edge cases ----

    #[test]
    fn unknown_tables_are_skipped_and_reported() {
        let out = run(r#"{"tables": {"sessions": {"data": [{"id": "x"}]}, "users": {"data": [{"id": "u1"}]}}}"#);
        assert_eq!(out.statements.len(), 1);
        assert_eq!(out.report.tables_skipped, vec!["sessions"]);
    }

    #[test]
    fn skipped_tables_are_reported_in_document_order() {
        let out = run(r#"{"tables": {"zeta": {"data": []}, "users": {"data": []}, "alpha": {"data": []}}}"#);
        assert_eq!(out.report.tables_skipped, vec!["zeta", "alpha"]);
    }

    #[test]
    fn empty_tables_emit_nothing() {
        let out = run(r#"{"tables": {"users": {"data": []}, "clients": {}}}"#);
        assert!(out.statements.is_empty());
        assert!(out.report.tables_converted.is_empty());
        assert!(out.report.tables_skipped.is_empty());
    }

    #[test]
    fn non_list_line_item_field_is_ignored() {
        let out = run(r#"{"tables": {"appointments": {"data": [{"id": "a1", "services": "s1"}]}}}"#);
        assert_eq!(out.statements.len(), 1);
    }

    #[test]
    fn non_object_line_item_is_skipped() {
        let out = run(r#"{"tables": {"appointments": {"data": [{"id": "a1", "services": ["s1", {"serviceId": "s2"}]}]}}}"#);
        assert_eq!(out.statements.len(), 2);
        assert_eq!(out.report.line_items_skipped, 1);
    }

    #[test]
    fn line_items_without_parent_key_abort() {
        let dump = Dump::from_json(
            r#"{"tables": {"appointments": {"data": [{"status": "DONE", "services": [{"serviceId": "s1"}]}]}}}"#,
        )
        .unwrap();
        let err = convert(&dump, &Catalog::builtin()).unwrap_err();
        assert!(matches!(
            err,
            ConvertError::MissingParentKey { entity: "Appointment", field: "services", row: 0, .. }
        ));
    }

    #[test]
    fn parent_without_key_but_no_line_items_converts() {
        let out = run(r#"{"tables": {"appointments": {"data": [{"status": "DONE", "services": []}]}}}"#);
        assert_eq!(lines(&out), vec![r#"INSERT INTO "Appointment" ("status") VALUES ('DONE');"#]);
    }

    #[test]
    fn booking_settings_arrays_use_text_array_literals() {
        let out = run(
            r#"{"tables": {"bookingSettings": {"data": [
                {"id": "bs1", "serviceIds": ["s1", "s2"], "barberIds": [], "schedule": {"mon": ["09:00"]}}
            ]}}}"#,
        );
        assert_eq!(
            lines(&out),
            vec![
                r#"INSERT INTO "BookingSettings" ("id", "serviceIds", "barberIds", "schedule") VALUES ('bs1', ARRAY['s1', 's2'], '{}'::text[], '{"mon":["09:00"]}'::jsonb);"#
            ]
        );
    }

    #[test]
    fn large_integers_keep_every_digit() {
        let out = run(r#"{"tables": {"services": {"data": [{"id": "s1", "price": 12345678901234567890123}]}}}"#);
        assert_eq!(
            lines(&out),
            vec![r#"INSERT INTO "Service" ("id", "price") VALUES ('s1', 12345678901234567890123);"#]
        );
    }

    #[test]
    fn report_counts_statements() {
        let out = run(
            r#"{"tables": {"appointments": {"data": [{"id": "a1", "services": [{"id": "s"}]}]}, "users": {"data": [{"id": "u"}]}}}"#,
        );
        assert_eq!(out.report.statements, 3);
    }

    #[test]
    fn custom_catalog_drives_emission() {
        let entities = [
            EntitySchema {
                name: "Order",
                columns: &["id", "total"],
                array_columns: &[],
            },
            EntitySchema {
                name: "OrderLine",
                columns: &["sku", "orderId"],
                array_columns: &[],
            },
        ];
        let tables = [TableBinding { dump_key: "orders", entity: "Order" }];
        let line_items = [LineItemRelation {
            parent: "Order",
            field: "lines",
            child: "OrderLine",
            foreign_key: "orderId",
            parent_key: "id",
        }];
        let catalog = Catalog::new(&entities, &tables, &line_items);
        let dump = Dump::from_json(
            r#"{"tables": {"orders": {"data": [{"id": 7, "total": 9.5, "lines": [{"sku": "A"}]}]}}}"#,
        )
        .unwrap();
        let out = convert(&dump, &catalog).unwrap();
        assert_eq!(
            lines(&out),
            vec![
                r#"INSERT INTO "Order" ("id", "total") VALUES (7, 9.5);"#,
                r#"INSERT INTO "OrderLine" ("sku", "orderId") VALUES ('A', 7);"#,
            ]
        );
    }

    // ---- Properties ----

    const KEY_POOL: &[&str] = &["id", "name", "phone", "email", "extra", "nested", "createdAt", "junk"];

    proptest! {
        #[test]
        fn filtered_columns_are_the_ordered_intersection(
            keys in prop::sample::subsequence(KEY_POOL.to_vec(), 0..=KEY_POOL.len()).prop_shuffle()
        ) {
            let row: Row = keys
                .iter()
                .map(|k| ((*k).to_string(), Value::String((*k).to_string())))
                .collect();
            let catalog = Catalog::builtin();
            let schema = catalog.entity("Client").unwrap();

            let filtered = filter_row(&row, schema);
            let kept: Vec<&str> = filtered.fields.iter().map(|(k, _)| *k).collect();
            let expected: Vec<&str> = keys.iter().copied().filter(|k| schema.has_column(k)).collect();
            prop_assert_eq!(&kept, &expected);
            prop_assert_eq!(filtered.dropped, keys.len() - expected.len());

            let statement = build_statement(&filtered, schema);
            prop_assert_eq!(statement.is_none(), expected.is_empty());
            if let Some(statement) = statement {
                let columns: Vec<&str> = statement.columns.iter().map(|(c, _)| c.as_str()).collect();
                prop_assert_eq!(columns, expected);
            }
        }
    }
}
