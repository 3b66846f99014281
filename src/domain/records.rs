// In-memory record store: the tabular dataset the scenarios draw their
// coefficients from.
//
// Records are immutable rows. Derived attributes are attached once by an
// explicit derivation step and reused afterwards; lookups fail fast so a
// missing value can never leak into a model as a silent zero.

use indexmap::IndexMap;

/// Errors from attribute access, derivation, and aggregation. Fatal for
/// the scenario that triggered them; other scenarios are unaffected.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("record {record} has no attribute '{attribute}'")]
    MissingAttribute { record: usize, attribute: String },

    #[error("attribute '{attribute}' on record {record} is not numeric")]
    NotNumeric { record: usize, attribute: String },

    #[error("attribute '{attribute}' on record {record} is not categorical")]
    NotCategorical { record: usize, attribute: String },

    #[error("cannot aggregate over empty group '{0}'")]
    EmptyGroup(String),
}

/// A single attribute value: numeric or categorical.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Number(f64),
    Text(String),
}

impl AttrValue {
    /// Label used when this value acts as a grouping key.
    fn label(&self) -> String {
        match self {
            AttrValue::Number(n) => n.to_string(),
            AttrValue::Text(s) => s.clone(),
        }
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        AttrValue::Number(value)
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Text(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Text(value)
    }
}

/// One row of the dataset, identified by a stable id.
#[derive(Debug, Clone)]
pub struct Record {
    id: usize,
    attrs: IndexMap<String, AttrValue>,
}

impl Record {
    pub fn new(id: usize, attrs: IndexMap<String, AttrValue>) -> Self {
        Self { id, attrs }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn get(&self, attribute: &str) -> Option<&AttrValue> {
        self.attrs.get(attribute)
    }

    /// Numeric attribute lookup; fails fast on absence or wrong type.
    pub fn number(&self, attribute: &str) -> Result<f64, DataError> {
        match self.get(attribute) {
            Some(AttrValue::Number(n)) => Ok(*n),
            Some(AttrValue::Text(_)) => Err(DataError::NotNumeric {
                record: self.id,
                attribute: attribute.to_string(),
            }),
            None => Err(DataError::MissingAttribute {
                record: self.id,
                attribute: attribute.to_string(),
            }),
        }
    }

    /// Categorical attribute lookup; fails fast on absence or wrong type.
    pub fn text(&self, attribute: &str) -> Result<&str, DataError> {
        match self.get(attribute) {
            Some(AttrValue::Text(s)) => Ok(s),
            Some(AttrValue::Number(_)) => Err(DataError::NotCategorical {
                record: self.id,
                attribute: attribute.to_string(),
            }),
            None => Err(DataError::MissingAttribute {
                record: self.id,
                attribute: attribute.to_string(),
            }),
        }
    }
}

/// How to reduce a group's attribute values to one scalar.
#[derive(Debug, Clone, Copy)]
pub enum Reducer {
    Mean,
    Sum,
    Count,
}

/// Ordered collection of records with derivation and group/aggregate
/// support.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: Vec<Record>,
}

impl RecordStore {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Attaches a derived attribute computed by a pure function of the
    /// existing attributes. Computed once: if the attribute is already
    /// present the call is a no-op, so scenario builders sharing a store
    /// stay idempotent. All values are computed before any is attached,
    /// so a failing derivation leaves no partial state.
    pub fn derive(
        &mut self,
        attribute: &str,
        derive_fn: impl Fn(&Record) -> Result<AttrValue, DataError>,
    ) -> Result<(), DataError> {
        if self
            .records
            .first()
            .is_some_and(|r| r.get(attribute).is_some())
        {
            tracing::debug!(attribute, "derived attribute already present, reusing");
            return Ok(());
        }

        let values: Vec<AttrValue> = self
            .records
            .iter()
            .map(&derive_fn)
            .collect::<Result<_, _>>()?;
        for (record, value) in self.records.iter_mut().zip(values) {
            record.attrs.insert(attribute.to_string(), value);
        }
        Ok(())
    }

    /// Groups records by a key attribute. Keys keep first-seen order.
    pub fn group_by(&self, key: &str) -> Result<IndexMap<String, Vec<&Record>>, DataError> {
        let mut groups: IndexMap<String, Vec<&Record>> = IndexMap::new();
        for record in &self.records {
            let label = match record.get(key) {
                Some(value) => value.label(),
                None => {
                    return Err(DataError::MissingAttribute {
                        record: record.id,
                        attribute: key.to_string(),
                    })
                }
            };
            groups.entry(label).or_default().push(record);
        }
        Ok(groups)
    }

    /// Reduces `attribute` over every group to one scalar per key.
    pub fn aggregate(
        groups: &IndexMap<String, Vec<&Record>>,
        attribute: &str,
        reducer: Reducer,
    ) -> Result<IndexMap<String, f64>, DataError> {
        let mut out = IndexMap::new();
        for (label, records) in groups {
            out.insert(label.clone(), reduce(label, records, attribute, reducer)?);
        }
        Ok(out)
    }

    /// Mean of a numeric attribute over the whole store.
    pub fn mean(&self, attribute: &str) -> Result<f64, DataError> {
        let all: Vec<&Record> = self.records.iter().collect();
        reduce("(all records)", &all, attribute, Reducer::Mean)
    }

    /// Sum of a numeric attribute over the whole store.
    pub fn sum(&self, attribute: &str) -> Result<f64, DataError> {
        let all: Vec<&Record> = self.records.iter().collect();
        reduce("(all records)", &all, attribute, Reducer::Sum)
    }
}

/// A group with zero records is a caller error, not a zero: the result
/// feeds straight into objective coefficients.
fn reduce(
    label: &str,
    records: &[&Record],
    attribute: &str,
    reducer: Reducer,
) -> Result<f64, DataError> {
    if records.is_empty() {
        return Err(DataError::EmptyGroup(label.to_string()));
    }
    match reducer {
        Reducer::Count => Ok(records.len() as f64),
        Reducer::Sum => records.iter().map(|r| r.number(attribute)).sum(),
        Reducer::Mean => {
            let sum: f64 = records
                .iter()
                .map(|r| r.number(attribute))
                .sum::<Result<f64, DataError>>()?;
            Ok(sum / records.len() as f64)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn store() -> RecordStore {
        let rows = [(20.0, "yes", 100.0), (40.0, "no", 200.0), (60.0, "yes", 400.0)];
        RecordStore::new(
            rows.iter()
                .enumerate()
                .map(|(id, (age, smoker, charges))| {
                    let mut attrs = IndexMap::new();
                    attrs.insert("age".to_string(), AttrValue::Number(*age));
                    attrs.insert("smoker".to_string(), AttrValue::from(*smoker));
                    attrs.insert("charges".to_string(), AttrValue::Number(*charges));
                    Record::new(id, attrs)
                })
                .collect(),
        )
    }

    #[test]
    fn derive_attaches_a_new_attribute() {
        let mut store = store();
        store
            .derive("risky", |r| {
                Ok(AttrValue::Number((r.number("age")? > 50.0) as u8 as f64))
            })
            .unwrap();
        assert_eq!(store.records()[0].number("risky").unwrap(), 0.0);
        assert_eq!(store.records()[2].number("risky").unwrap(), 1.0);
    }

    #[test]
    fn derive_referencing_missing_attribute_fails() {
        let mut store = store();
        let err = store
            .derive("broken", |r| Ok(AttrValue::Number(r.number("income")?)))
            .unwrap_err();
        assert!(matches!(err, DataError::MissingAttribute { .. }));
        // nothing was attached
        assert!(store.records()[0].get("broken").is_none());
    }

    #[test]
    fn derive_is_idempotent() {
        let mut store = store();
        store.derive("flag", |_| Ok(AttrValue::Number(1.0))).unwrap();
        // second derivation must not recompute or fail
        store.derive("flag", |_| Ok(AttrValue::Number(2.0))).unwrap();
        assert_eq!(store.records()[0].number("flag").unwrap(), 1.0);
    }

    #[test]
    fn group_by_keeps_first_seen_order() {
        let store = store();
        let groups = store.group_by("smoker").unwrap();
        let keys: Vec<&String> = groups.keys().collect();
        assert_eq!(keys, ["yes", "no"]);
        assert_eq!(groups["yes"].len(), 2);
    }

    #[test]
    fn aggregate_mean_and_sum() {
        let store = store();
        let groups = store.group_by("smoker").unwrap();
        let means = RecordStore::aggregate(&groups, "charges", Reducer::Mean).unwrap();
        assert_relative_eq!(means["yes"], 250.0);
        assert_relative_eq!(means["no"], 200.0);

        let counts = RecordStore::aggregate(&groups, "charges", Reducer::Count).unwrap();
        assert_eq!(counts["yes"], 2.0);

        assert_relative_eq!(store.sum("charges").unwrap(), 700.0);
    }

    #[test]
    fn aggregating_an_empty_group_fails() {
        let empty = RecordStore::default();
        let err = empty.mean("charges").unwrap_err();
        assert!(matches!(err, DataError::EmptyGroup(_)));
    }

    #[test]
    fn typed_access_fails_fast() {
        let store = store();
        assert!(matches!(
            store.records()[0].number("smoker").unwrap_err(),
            DataError::NotNumeric { .. }
        ));
        assert!(matches!(
            store.records()[0].text("age").unwrap_err(),
            DataError::NotCategorical { .. }
        ));
    }
}
