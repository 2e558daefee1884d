//! Coverage report interpretation.
//!
//! Reads the instrumentation tool's XML report and answers one question:
//! which of a set of candidate methods were exercised? A method counts as
//! covered when its `INSTRUCTION` counter reports at least one covered
//! unit.
//!
//! Matching is by exact internal class name (first entry wins) and exact
//! method name with a descriptor *prefix* match, since candidate
//! identifiers do not carry return types. With overloads differing only in
//! return type, or duplicate class names across modules, this can attribute
//! coverage to the wrong entry; the behavior is kept as-is because the
//! identifiers produced upstream are matched the same way end to end.

use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use crate::method_id::MethodId;
use crate::result::{VerificarError, VerificarResult};

/// Counter type consulted for coverage decisions.
const INSTRUCTION_COUNTER: &str = "INSTRUCTION";

/// Parsed coverage report: packages of classes of methods with counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename = "report")]
pub struct CoverageReport {
    /// Packages in the report.
    #[serde(rename = "package", default)]
    pub packages: Vec<PackageCoverage>,
}

/// Coverage entries for one package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PackageCoverage {
    /// Internal package name (`com/example`).
    #[serde(rename = "@name", default)]
    pub name: String,
    /// Classes in the package.
    #[serde(rename = "class", default)]
    pub classes: Vec<ClassCoverage>,
}

/// Coverage entries for one class.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ClassCoverage {
    /// Internal class name (`com/example/Foo`).
    #[serde(rename = "@name", default)]
    pub name: String,
    /// Methods of the class.
    #[serde(rename = "method", default)]
    pub methods: Vec<MethodCoverage>,
}

/// Coverage counters for one method.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MethodCoverage {
    /// Method name.
    #[serde(rename = "@name", default)]
    pub name: String,
    /// JVM descriptor, including return type.
    #[serde(rename = "@desc", default)]
    pub desc: String,
    /// Typed counters reported for the method.
    #[serde(rename = "counter", default)]
    pub counters: Vec<CoverageCounter>,
}

impl MethodCoverage {
    /// Covered units of the `INSTRUCTION` counter, 0 when absent.
    pub fn instruction_covered(&self) -> u64 {
        self.counters
            .iter()
            .find(|c| c.kind == INSTRUCTION_COUNTER)
            .map_or(0, |c| c.covered)
    }
}

/// One typed counter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CoverageCounter {
    /// Counter type (`INSTRUCTION`, `LINE`, ...).
    #[serde(rename = "@type", default)]
    pub kind: String,
    /// Units not executed.
    #[serde(rename = "@missed", default)]
    pub missed: u64,
    /// Units executed.
    #[serde(rename = "@covered", default)]
    pub covered: u64,
}

impl CoverageReport {
    /// Parse a report from its XML form.
    pub fn from_xml(xml: &str) -> VerificarResult<Self> {
        quick_xml::de::from_str(xml).map_err(|e| VerificarError::coverage_report(e.to_string()))
    }

    /// Read a report from disk, degrading to an empty report when the file
    /// is missing or unreadable. The caller's fallback for an empty report
    /// is "nothing covered", so nothing is raised past this boundary.
    pub fn load_or_empty(path: &Path) -> Self {
        let xml = match std::fs::read_to_string(path) {
            Ok(xml) => xml,
            Err(e) => {
                warn!(report = %path.display(), error = %e, "coverage report unavailable");
                return Self::default();
            }
        };
        match Self::from_xml(&xml) {
            Ok(report) => report,
            Err(e) => {
                warn!(report = %path.display(), error = %e, "coverage report unparseable");
                Self::default()
            }
        }
    }

    /// All class entries across packages, in report order.
    pub fn classes(&self) -> impl Iterator<Item = &ClassCoverage> {
        self.packages.iter().flat_map(|p| p.classes.iter())
    }

    /// Whether the given method is covered in this report.
    ///
    /// The first class whose internal name matches is consulted; within it,
    /// any method with the same name whose descriptor starts with the
    /// candidate's parameter prefix and has a positive instruction count
    /// qualifies.
    pub fn is_method_covered(&self, method: &MethodId) -> bool {
        let class_name = method.internal_class_name();
        let prefix = method.descriptor_prefix();
        let Some(class) = self.classes().find(|c| c.name == class_name) else {
            return false;
        };
        class.methods.iter().any(|m| {
            m.name == method.method_name()
                && m.desc.starts_with(&prefix)
                && m.instruction_covered() > 0
        })
    }

    /// The subset of `candidate_ids` observed as covered, order-preserving.
    ///
    /// Malformed identifiers are skipped with a warning; they never abort
    /// the query.
    pub fn covered_methods(&self, candidate_ids: &[String]) -> Vec<String> {
        let mut covered = Vec::new();
        for id in candidate_ids {
            let method = match MethodId::parse(id) {
                Ok(method) => method,
                Err(e) => {
                    warn!(method_id = %id, error = %e, "skipping unparseable candidate");
                    continue;
                }
            };
            if self.is_method_covered(&method) {
                covered.push(id.clone());
            }
        }
        covered
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const SAMPLE_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<!DOCTYPE report PUBLIC "-//JACOCO//DTD Report 1.1//EN" "report.dtd">
<report name="acme">
  <sessioninfo id="host-1" start="1700000000000" dump="1700000001000"/>
  <package name="com/example">
    <class name="com/example/Foo" sourcefilename="Foo.java">
      <method name="bar" desc="(I)V" line="10">
        <counter type="INSTRUCTION" missed="0" covered="5"/>
        <counter type="LINE" missed="0" covered="2"/>
        <counter type="METHOD" missed="0" covered="1"/>
      </method>
      <method name="baz" desc="()V" line="20">
        <counter type="INSTRUCTION" missed="7" covered="0"/>
      </method>
    </class>
    <sourcefile name="Foo.java">
      <counter type="LINE" missed="1" covered="2"/>
    </sourcefile>
  </package>
  <counter type="INSTRUCTION" missed="7" covered="5"/>
</report>"#;

    fn method(id: &str) -> MethodId {
        MethodId::parse(id).unwrap()
    }

    mod parsing {
        use super::*;

        #[test]
        fn test_parse_sample_report() {
            let report = CoverageReport::from_xml(SAMPLE_XML).unwrap();
            assert_eq!(report.packages.len(), 1);
            assert_eq!(report.packages[0].classes.len(), 1);
            let class = &report.packages[0].classes[0];
            assert_eq!(class.name, "com/example/Foo");
            assert_eq!(class.methods.len(), 2);
            assert_eq!(class.methods[0].desc, "(I)V");
        }

        #[test]
        fn test_parse_garbage_is_error() {
            assert!(CoverageReport::from_xml("not xml at all").is_err());
        }

        #[test]
        fn test_load_or_empty_missing_file() {
            let report = CoverageReport::load_or_empty(Path::new("/nonexistent/jacoco.xml"));
            assert!(report.packages.is_empty());
        }

        #[test]
        fn test_load_or_empty_unparseable_file() {
            let temp = tempfile::TempDir::new().unwrap();
            let path = temp.path().join("jacoco.xml");
            std::fs::write(&path, "<report><package></report>").unwrap();
            let report = CoverageReport::load_or_empty(&path);
            assert!(report.packages.is_empty());
        }

        #[test]
        fn test_instruction_counter_selected_among_others() {
            let report = CoverageReport::from_xml(SAMPLE_XML).unwrap();
            let bar = &report.packages[0].classes[0].methods[0];
            assert_eq!(bar.instruction_covered(), 5);
        }

        #[test]
        fn test_missing_instruction_counter_counts_as_zero() {
            let m = MethodCoverage {
                name: "bar".to_string(),
                desc: "(I)V".to_string(),
                counters: vec![CoverageCounter {
                    kind: "LINE".to_string(),
                    missed: 0,
                    covered: 3,
                }],
            };
            assert_eq!(m.instruction_covered(), 0);
        }
    }

    mod matching {
        use super::*;

        #[test]
        fn test_covered_method_matches() {
            let report = CoverageReport::from_xml(SAMPLE_XML).unwrap();
            assert!(report.is_method_covered(&method("com.example.Foo.bar(int)")));
        }

        #[test]
        fn test_zero_covered_is_not_covered() {
            let report = CoverageReport::from_xml(SAMPLE_XML).unwrap();
            assert!(!report.is_method_covered(&method("com.example.Foo.baz()")));
        }

        #[test]
        fn test_unknown_class_is_not_covered() {
            let report = CoverageReport::from_xml(SAMPLE_XML).unwrap();
            assert!(!report.is_method_covered(&method("com.example.Missing.bar(int)")));
        }

        #[test]
        fn test_wrong_params_do_not_match() {
            let report = CoverageReport::from_xml(SAMPLE_XML).unwrap();
            assert!(!report.is_method_covered(&method("com.example.Foo.bar(long)")));
        }

        #[test]
        fn test_prefix_tolerates_return_type() {
            // Descriptor "(I)V" vs prefix "(I)": return type ignored.
            let report = CoverageReport::from_xml(SAMPLE_XML).unwrap();
            assert!(report.is_method_covered(&method("com.example.Foo.bar(int)")));
        }

        #[test]
        fn test_prefix_match_can_cross_overloads() {
            // "(IJ)V" starts with "(I)"; the known imprecision.
            let report = CoverageReport {
                packages: vec![PackageCoverage {
                    name: "com/example".to_string(),
                    classes: vec![ClassCoverage {
                        name: "com/example/Foo".to_string(),
                        methods: vec![MethodCoverage {
                            name: "bar".to_string(),
                            desc: "(IJ)V".to_string(),
                            counters: vec![CoverageCounter {
                                kind: "INSTRUCTION".to_string(),
                                missed: 0,
                                covered: 3,
                            }],
                        }],
                    }],
                }],
            };
            assert!(report.is_method_covered(&method("com.example.Foo.bar(int)")));
        }

        #[test]
        fn test_first_class_entry_wins() {
            // Duplicate class names: only the first entry is consulted,
            // even if a later one would match.
            let uncovered = ClassCoverage {
                name: "com/example/Foo".to_string(),
                methods: vec![MethodCoverage {
                    name: "bar".to_string(),
                    desc: "(I)V".to_string(),
                    counters: vec![CoverageCounter {
                        kind: "INSTRUCTION".to_string(),
                        missed: 5,
                        covered: 0,
                    }],
                }],
            };
            let covered = ClassCoverage {
                methods: vec![MethodCoverage {
                    counters: vec![CoverageCounter {
                        kind: "INSTRUCTION".to_string(),
                        missed: 0,
                        covered: 9,
                    }],
                    ..uncovered.methods[0].clone()
                }],
                ..uncovered.clone()
            };
            let report = CoverageReport {
                packages: vec![PackageCoverage {
                    name: "com/example".to_string(),
                    classes: vec![uncovered, covered],
                }],
            };
            assert!(!report.is_method_covered(&method("com.example.Foo.bar(int)")));
        }

        #[test]
        fn test_uncovered_then_covered_overload_qualifies() {
            // Within one class the scan continues past uncovered entries.
            let report = CoverageReport {
                packages: vec![PackageCoverage {
                    name: "com/example".to_string(),
                    classes: vec![ClassCoverage {
                        name: "com/example/Foo".to_string(),
                        methods: vec![
                            MethodCoverage {
                                name: "bar".to_string(),
                                desc: "(I)V".to_string(),
                                counters: vec![CoverageCounter {
                                    kind: "INSTRUCTION".to_string(),
                                    missed: 4,
                                    covered: 0,
                                }],
                            },
                            MethodCoverage {
                                name: "bar".to_string(),
                                desc: "(I)J".to_string(),
                                counters: vec![CoverageCounter {
                                    kind: "INSTRUCTION".to_string(),
                                    missed: 0,
                                    covered: 2,
                                }],
                            },
                        ],
                    }],
                }],
            };
            assert!(report.is_method_covered(&method("com.example.Foo.bar(int)")));
        }
    }

    mod queries {
        use super::*;

        #[test]
        fn test_covered_methods_subset_and_order() {
            let report = CoverageReport::from_xml(SAMPLE_XML).unwrap();
            let candidates = vec![
                "com.example.Foo.baz()".to_string(),
                "com.example.Foo.bar(int)".to_string(),
                "com.example.Other.qux()".to_string(),
            ];
            let covered = report.covered_methods(&candidates);
            assert_eq!(covered, vec!["com.example.Foo.bar(int)".to_string()]);
        }

        #[test]
        fn test_malformed_candidate_skipped() {
            let report = CoverageReport::from_xml(SAMPLE_XML).unwrap();
            let candidates = vec![
                "no-qualifier(int)".to_string(),
                "com.example.Foo.bar(int)".to_string(),
            ];
            let covered = report.covered_methods(&candidates);
            assert_eq!(covered, vec!["com.example.Foo.bar(int)".to_string()]);
        }

        #[test]
        fn test_empty_report_covers_nothing() {
            let report = CoverageReport::default();
            let candidates = vec!["com.example.Foo.bar(int)".to_string()];
            assert!(report.covered_methods(&candidates).is_empty());
        }
    }
}
