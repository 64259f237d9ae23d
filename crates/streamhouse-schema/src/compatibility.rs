//! Topic Schema Compatibility
//!
//! Decides whether a producer or consumer may bind to a topic with the schema
//! it declared (or with no schema at all).
//!
//! Producers author a topic's contract and are held to strict matching.
//! Consumers may always fall back to reading raw bytes, so a schemaless
//! subscription is never rejected.
//!
//! | State   | Role     | Declared                   | Outcome                    |
//! |---------|----------|----------------------------|----------------------------|
//! | UNBOUND | any      | present                    | register, first version    |
//! | any     | producer | absent, enforced           | IncompatibleSchema         |
//! | any     | producer | absent, not enforced       | schemaless                 |
//! | any     | consumer | absent                     | schemaless                 |
//! | BOUND   | producer | type + definition equal    | existing version           |
//! | BOUND   | consumer | type equal                 | existing version           |
//! | BOUND   | any      | otherwise                  | IncompatibleSchema         |
//!
//! Structural evolution rules belong to the registry; this module only
//! compares types and definition bytes.

use crate::{
    error::{Result, SchemaError},
    registry::SchemaRegistry,
    types::{SchemaInfo, SchemaRole, SchemaType, SchemaVersion},
};
use tracing::{debug, warn};

/// Binding state of one topic, owned by the registry
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TopicBinding {
    /// No schema has ever been registered
    #[default]
    Unbound,
    Bound {
        schema: SchemaInfo,
        version: SchemaVersion,
    },
}

impl TopicBinding {
    pub fn is_bound(&self) -> bool {
        matches!(self, TopicBinding::Bound { .. })
    }

    pub fn schema(&self) -> Option<&SchemaInfo> {
        match self {
            TopicBinding::Unbound => None,
            TopicBinding::Bound { schema, .. } => Some(schema),
        }
    }

    pub fn version(&self) -> Option<SchemaVersion> {
        match self {
            TopicBinding::Unbound => None,
            TopicBinding::Bound { version, .. } => Some(*version),
        }
    }
}

/// What a registry should do with an accepted binding request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Bind the topic to this schema and issue its first version
    Register(SchemaInfo),
    /// Reuse the version of the schema already bound
    Existing(SchemaVersion),
    /// Accept without a schema; messages carry no version tag
    Schemaless,
}

/// Result of a successful binding, as seen by the client
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BindOutcome {
    pub schema: Option<SchemaInfo>,
    pub version: Option<SchemaVersion>,
}

impl BindOutcome {
    pub fn schemaless() -> Self {
        Self::default()
    }
}

/// Producer matching: same type and byte-identical definition
pub fn schema_matches(bound: &SchemaInfo, declared: &SchemaInfo) -> bool {
    bound.schema_type() == declared.schema_type() && bound.definition() == declared.definition()
}

fn incompatible(
    topic: &str,
    role: SchemaRole,
    expected: Option<SchemaType>,
    actual: Option<SchemaType>,
    reason: &str,
) -> SchemaError {
    SchemaError::IncompatibleSchema {
        topic: topic.to_string(),
        role,
        expected,
        actual,
        reason: reason.to_string(),
    }
}

fn resolve_absent(
    topic: &str,
    bound_type: Option<SchemaType>,
    role: SchemaRole,
    validation_enforced: bool,
) -> Result<Resolution> {
    match role {
        SchemaRole::Consumer => Ok(Resolution::Schemaless),
        SchemaRole::Producer if validation_enforced => Err(incompatible(
            topic,
            role,
            bound_type,
            None,
            "schema validation is enforced and the producer declared no schema",
        )),
        SchemaRole::Producer => Ok(Resolution::Schemaless),
    }
}

/// Apply the compatibility table to one request
///
/// Pure function over a snapshot of the topic state. Registries call this
/// while holding whatever serializes their per-topic decisions.
pub fn evaluate(
    topic: &str,
    state: &TopicBinding,
    role: SchemaRole,
    declared: Option<&SchemaInfo>,
    validation_enforced: bool,
) -> Result<Resolution> {
    let Some(declared) = declared else {
        let bound_type = state.schema().map(SchemaInfo::schema_type);
        return resolve_absent(topic, bound_type, role, validation_enforced);
    };

    let (bound, version) = match state {
        TopicBinding::Unbound => return Ok(Resolution::Register(declared.clone())),
        TopicBinding::Bound { schema, version } => (schema, *version),
    };

    let expected = Some(bound.schema_type());
    let actual = Some(declared.schema_type());

    match role {
        SchemaRole::Producer if schema_matches(bound, declared) => Ok(Resolution::Existing(version)),
        SchemaRole::Producer if expected != actual => Err(incompatible(
            topic,
            role,
            expected,
            actual,
            "schema type differs from the bound schema",
        )),
        SchemaRole::Producer => Err(incompatible(
            topic,
            role,
            expected,
            actual,
            "schema definition differs from the bound schema",
        )),
        SchemaRole::Consumer if expected == actual => Ok(Resolution::Existing(version)),
        SchemaRole::Consumer => Err(incompatible(
            topic,
            role,
            expected,
            actual,
            "schema type differs from the bound schema",
        )),
    }
}

/// Client-side view of the compatibility policy
///
/// Requests without a schema are answered locally; requests with a schema go
/// to the registry, which owns the topic state.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaCompatibilityResolver {
    validation_enforced: bool,
}

impl SchemaCompatibilityResolver {
    pub fn new(validation_enforced: bool) -> Self {
        Self {
            validation_enforced,
        }
    }

    pub fn validation_enforced(&self) -> bool {
        self.validation_enforced
    }

    /// Answer a request without a registry round trip, when possible
    ///
    /// Only accepted schemaless requests are answered here: absent-schema
    /// consumers, and absent-schema producers while validation is relaxed.
    /// An enforced rejection goes to the registry so that it reports the
    /// topic's bound type. Returns `None` when the registry must decide.
    pub fn decide_locally(
        &self,
        role: SchemaRole,
        declared: Option<&SchemaInfo>,
    ) -> Option<BindOutcome> {
        match (role, declared) {
            (_, Some(_)) => None,
            (SchemaRole::Producer, None) if self.validation_enforced => None,
            (_, None) => Some(BindOutcome::schemaless()),
        }
    }

    /// Decide a binding request, consulting the registry when required
    pub async fn resolve(
        &self,
        registry: &dyn SchemaRegistry,
        topic: &str,
        role: SchemaRole,
        declared: Option<&SchemaInfo>,
    ) -> Result<BindOutcome> {
        if let Some(outcome) = self.decide_locally(role, declared) {
            debug!(topic = %topic, role = %role, "Schemaless binding decided locally");
            return Ok(outcome);
        }

        let version = registry
            .check_or_bind(topic, role, declared, self.validation_enforced)
            .await
            .map_err(|e| {
                if let SchemaError::IncompatibleSchema { .. } = &e {
                    warn!(topic = %topic, role = %role, error = %e, "Schema rejected by registry");
                }
                e
            })?;

        Ok(BindOutcome {
            schema: declared.cloned(),
            version,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE_SCHEMA: &str = r#"{"type":"record","name":"Example","namespace":"test","fields":[{"name":"a","type":"int"},{"name":"b","type":"int"}]}"#;

    fn avro() -> SchemaInfo {
        SchemaInfo::new(SchemaType::Avro, "Avro", EXAMPLE_SCHEMA)
    }

    fn json() -> SchemaInfo {
        SchemaInfo::new(SchemaType::Json, "Json", "{}")
    }

    fn bound_avro() -> TopicBinding {
        TopicBinding::Bound {
            schema: avro(),
            version: SchemaVersion::ZERO,
        }
    }

    fn is_incompatible(result: &Result<Resolution>) -> bool {
        matches!(result, Err(SchemaError::IncompatibleSchema { .. }))
    }

    // ========================================================================
    // UNBOUND topic
    // ========================================================================

    #[test]
    fn test_unbound_producer_with_schema_registers() {
        let result = evaluate("t", &TopicBinding::Unbound, SchemaRole::Producer, Some(&avro()), true);
        assert_eq!(result.unwrap(), Resolution::Register(avro()));
    }

    #[test]
    fn test_unbound_producer_absent_not_enforced_is_schemaless() {
        let result = evaluate("t", &TopicBinding::Unbound, SchemaRole::Producer, None, false);
        assert_eq!(result.unwrap(), Resolution::Schemaless);
    }

    #[test]
    fn test_unbound_producer_absent_enforced_fails() {
        let result = evaluate("t", &TopicBinding::Unbound, SchemaRole::Producer, None, true);
        assert!(is_incompatible(&result));
    }

    #[test]
    fn test_unbound_consumer_always_succeeds() {
        for enforced in [false, true] {
            let absent = evaluate("t", &TopicBinding::Unbound, SchemaRole::Consumer, None, enforced);
            assert_eq!(absent.unwrap(), Resolution::Schemaless);

            let present =
                evaluate("t", &TopicBinding::Unbound, SchemaRole::Consumer, Some(&json()), enforced);
            assert_eq!(present.unwrap(), Resolution::Register(json()));
        }
    }

    // ========================================================================
    // BOUND topic, producers
    // ========================================================================

    #[test]
    fn test_bound_producer_same_schema_reuses_version() {
        let state = TopicBinding::Bound {
            schema: avro(),
            version: SchemaVersion::from_u64(3),
        };
        let result = evaluate("t", &state, SchemaRole::Producer, Some(&avro()), true);
        assert_eq!(result.unwrap(), Resolution::Existing(SchemaVersion::from_u64(3)));
    }

    #[test]
    fn test_bound_producer_ignores_name_and_properties() {
        let renamed = SchemaInfo::new(SchemaType::Avro, "SomethingElse", EXAMPLE_SCHEMA);
        let result = evaluate("t", &bound_avro(), SchemaRole::Producer, Some(&renamed), true);
        assert_eq!(result.unwrap(), Resolution::Existing(SchemaVersion::ZERO));
    }

    #[test]
    fn test_bound_producer_different_type_fails() {
        let result = evaluate("topic-avro", &bound_avro(), SchemaRole::Producer, Some(&json()), false);
        match result {
            Err(SchemaError::IncompatibleSchema {
                topic,
                role,
                expected,
                actual,
                ..
            }) => {
                assert_eq!(topic, "topic-avro");
                assert_eq!(role, SchemaRole::Producer);
                assert_eq!(expected, Some(SchemaType::Avro));
                assert_eq!(actual, Some(SchemaType::Json));
            }
            other => panic!("expected IncompatibleSchema, got {:?}", other),
        }
    }

    #[test]
    fn test_bound_producer_different_definition_fails() {
        let other = SchemaInfo::new(SchemaType::Avro, "Avro", r#"{"type":"string"}"#);
        let result = evaluate("t", &bound_avro(), SchemaRole::Producer, Some(&other), false);
        assert!(is_incompatible(&result));
    }

    #[test]
    fn test_bound_producer_absent_follows_enforcement() {
        let enforced = evaluate("t", &bound_avro(), SchemaRole::Producer, None, true);
        match enforced {
            Err(SchemaError::IncompatibleSchema { expected, actual, .. }) => {
                assert_eq!(expected, Some(SchemaType::Avro));
                assert_eq!(actual, None);
            }
            other => panic!("expected IncompatibleSchema, got {:?}", other),
        }

        let relaxed = evaluate("t", &bound_avro(), SchemaRole::Producer, None, false);
        assert_eq!(relaxed.unwrap(), Resolution::Schemaless);
    }

    // ========================================================================
    // BOUND topic, consumers
    // ========================================================================

    #[test]
    fn test_bound_consumer_absent_always_succeeds() {
        for enforced in [false, true] {
            let result = evaluate("t", &bound_avro(), SchemaRole::Consumer, None, enforced);
            assert_eq!(result.unwrap(), Resolution::Schemaless);
        }
    }

    #[test]
    fn test_bound_consumer_same_type_succeeds() {
        let result = evaluate("t", &bound_avro(), SchemaRole::Consumer, Some(&avro()), true);
        assert_eq!(result.unwrap(), Resolution::Existing(SchemaVersion::ZERO));

        // Consumers only need the type to match
        let other_def = SchemaInfo::new(SchemaType::Avro, "Avro", r#"{"type":"string"}"#);
        let result = evaluate("t", &bound_avro(), SchemaRole::Consumer, Some(&other_def), true);
        assert!(result.is_ok());
    }

    #[test]
    fn test_bound_consumer_different_type_fails() {
        let result = evaluate("t", &bound_avro(), SchemaRole::Consumer, Some(&json()), true);
        assert!(is_incompatible(&result));
    }

    // ========================================================================
    // Local decisions
    // ========================================================================

    #[test]
    fn test_decide_locally_only_for_accepted_absent_schema() {
        let resolver = SchemaCompatibilityResolver::new(true);
        assert!(resolver
            .decide_locally(SchemaRole::Producer, Some(&avro()))
            .is_none());

        // Enforced rejections need the bound type, which only the registry knows
        assert!(resolver.decide_locally(SchemaRole::Producer, None).is_none());

        let consumer = resolver.decide_locally(SchemaRole::Consumer, None);
        assert_eq!(consumer, Some(BindOutcome::schemaless()));
    }

    #[test]
    fn test_decide_locally_relaxed_producer() {
        let resolver = SchemaCompatibilityResolver::new(false);
        let outcome = resolver.decide_locally(SchemaRole::Producer, None);
        assert_eq!(outcome, Some(BindOutcome::schemaless()));
        assert!(!resolver.validation_enforced());
    }

    #[tokio::test]
    async fn test_enforced_absent_producer_reports_bound_type() {
        let registry = crate::registry::MemorySchemaRegistry::new();
        let resolver = SchemaCompatibilityResolver::new(true);
        resolver
            .resolve(&registry, "topic-avro", SchemaRole::Producer, Some(&avro()))
            .await
            .unwrap();

        let result = resolver
            .resolve(&registry, "topic-avro", SchemaRole::Producer, None)
            .await;
        match result {
            Err(SchemaError::IncompatibleSchema { expected, actual, .. }) => {
                assert_eq!(expected, Some(SchemaType::Avro));
                assert_eq!(actual, None);
            }
            other => panic!("expected IncompatibleSchema, got {:?}", other),
        }
    }

    #[test]
    fn test_topic_binding_accessors() {
        assert!(!TopicBinding::Unbound.is_bound());
        assert_eq!(TopicBinding::Unbound.schema(), None);
        assert_eq!(TopicBinding::default(), TopicBinding::Unbound);

        let bound = bound_avro();
        assert!(bound.is_bound());
        assert_eq!(bound.schema(), Some(&avro()));
        assert_eq!(bound.version(), Some(SchemaVersion::ZERO));
    }
}
