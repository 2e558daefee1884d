//! Build-descriptor rewriting.
//!
//! Three transformations prepare a checkout for instrumented test runs:
//! coverage-plugin injection, parent-version `-SNAPSHOT` stripping, and
//! declared Java version extraction. All of them operate on document
//! strings so they can be exercised without a build tool.
//!
//! Rewrites are event-driven: the document is tokenized and reassembled
//! from the original text spans, so formatting outside the touched
//! elements survives byte-for-byte. Injection is idempotent: any existing
//! `org.jacoco` plugin block is replaced wholesale, never duplicated.

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::result::VerificarResult;

/// Instrumentation plugin written into every prepared descriptor.
const JACOCO_PLUGIN: &str = "<plugin>\
<groupId>org.jacoco</groupId>\
<artifactId>jacoco-maven-plugin</artifactId>\
<version>0.8.11</version>\
<executions>\
<execution><goals><goal>prepare-agent</goal></goals></execution>\
<execution><id>report</id><phase>test</phase><goals><goal>report</goal></goals></execution>\
</executions>\
</plugin>";

const PLUGINS_PATH: &[&[u8]] = &[b"project", b"build", b"plugins"];
const BUILD_PATH: &[&[u8]] = &[b"project", b"build"];
const PROJECT_PATH: &[&[u8]] = &[b"project"];
const PARENT_VERSION_PATH: &[&[u8]] = &[b"project", b"parent"];
const PROPERTIES_PATH: &[&[u8]] = &[b"project", b"properties"];

/// Inject the coverage plugin into `project/build/plugins`.
///
/// Any pre-existing jacoco plugin entry is dropped and the canonical block
/// written in its section instead; missing `<plugins>` or `<build>`
/// sections are created. Applying the rewrite twice yields the same
/// document as applying it once.
pub fn inject_jacoco_plugin(pom: &str) -> VerificarResult<String> {
    let mut reader = Reader::from_str(pom);
    let mut out = String::with_capacity(pom.len() + JACOCO_PLUGIN.len() + 64);
    let mut path: Vec<Vec<u8>> = Vec::new();
    let mut injected = false;

    loop {
        let before = position(&reader);
        match reader.read_event()? {
            Event::Eof => break,
            Event::Start(e) => {
                let name = e.local_name().as_ref().to_vec();
                if name == b"plugin" && path_is(&path, PLUGINS_PATH) {
                    let block = reader.read_text(e.name())?;
                    if is_jacoco_plugin(&block) {
                        // dropped here, canonical block lands at </plugins>
                        continue;
                    }
                    out.push_str(&pom[before..position(&reader)]);
                    continue;
                }
                path.push(name);
                out.push_str(&pom[before..position(&reader)]);
            }
            Event::End(_) => {
                if !injected && path_is(&path, PLUGINS_PATH) {
                    out.push_str(JACOCO_PLUGIN);
                    injected = true;
                } else if !injected && path_is(&path, BUILD_PATH) {
                    out.push_str("<plugins>");
                    out.push_str(JACOCO_PLUGIN);
                    out.push_str("</plugins>");
                    injected = true;
                } else if !injected && path_is(&path, PROJECT_PATH) {
                    out.push_str("<build><plugins>");
                    out.push_str(JACOCO_PLUGIN);
                    out.push_str("</plugins></build>");
                    injected = true;
                }
                path.pop();
                out.push_str(&pom[before..position(&reader)]);
            }
            Event::Empty(e) => {
                let name = e.local_name();
                if !injected && name.as_ref() == b"plugins" && path_is(&path, BUILD_PATH) {
                    out.push_str("<plugins>");
                    out.push_str(JACOCO_PLUGIN);
                    out.push_str("</plugins>");
                    injected = true;
                    continue;
                }
                if !injected && name.as_ref() == b"build" && path_is(&path, PROJECT_PATH) {
                    out.push_str("<build><plugins>");
                    out.push_str(JACOCO_PLUGIN);
                    out.push_str("</plugins></build>");
                    injected = true;
                    continue;
                }
                out.push_str(&pom[before..position(&reader)]);
            }
            _ => out.push_str(&pom[before..position(&reader)]),
        }
    }
    Ok(out)
}

/// Strip a `-SNAPSHOT` suffix from the inherited `<parent><version>`.
///
/// Returns the rewritten document and whether anything changed. The
/// project's own version is left alone.
pub fn strip_parent_snapshot(pom: &str) -> VerificarResult<(String, bool)> {
    let mut reader = Reader::from_str(pom);
    let mut out = String::with_capacity(pom.len());
    let mut path: Vec<Vec<u8>> = Vec::new();
    let mut stripped = false;

    loop {
        let before = position(&reader);
        match reader.read_event()? {
            Event::Eof => break,
            Event::Start(e) => {
                let name = e.local_name().as_ref().to_vec();
                if name == b"version" && path_is(&path, PARENT_VERSION_PATH) {
                    let inner = reader.read_text(e.name())?;
                    match inner.trim().strip_suffix("-SNAPSHOT") {
                        Some(base) => {
                            out.push_str("<version>");
                            out.push_str(base);
                            out.push_str("</version>");
                            stripped = true;
                        }
                        None => out.push_str(&pom[before..position(&reader)]),
                    }
                    continue;
                }
                path.push(name);
                out.push_str(&pom[before..position(&reader)]);
            }
            Event::End(_) => {
                path.pop();
                out.push_str(&pom[before..position(&reader)]);
            }
            _ => out.push_str(&pom[before..position(&reader)]),
        }
    }
    Ok((out, stripped))
}

/// Read the Java version declared under `project/properties`.
///
/// `javac.src.version` wins over `javac.target.version`. The value is
/// returned as declared; legacy `1.x` normalization happens at toolchain
/// selection. Unreadable documents yield `None`.
#[must_use]
pub fn declared_java_version(pom: &str) -> Option<String> {
    let mut reader = Reader::from_str(pom);
    let mut path: Vec<Vec<u8>> = Vec::new();
    let mut target = None;

    loop {
        match reader.read_event() {
            Ok(Event::Eof) | Err(_) => break,
            Ok(Event::Start(e)) => {
                let name = e.local_name().as_ref().to_vec();
                if path_is(&path, PROPERTIES_PATH)
                    && (name == b"javac.src.version" || name == b"javac.target.version")
                {
                    let Ok(text) = reader.read_text(e.name()) else {
                        break;
                    };
                    let value = text.trim().to_string();
                    if name == b"javac.src.version" {
                        return Some(value);
                    }
                    target = Some(value);
                    continue;
                }
                path.push(name);
            }
            Ok(Event::End(_)) => {
                path.pop();
            }
            Ok(_) => {}
        }
    }
    target
}

/// Full descriptor preparation: plugin injection plus parent-version
/// normalization. Returns the rewritten document and whether a `-SNAPSHOT`
/// suffix was stripped.
pub fn rewrite_for_coverage(pom: &str) -> VerificarResult<(String, bool)> {
    let with_plugin = inject_jacoco_plugin(pom)?;
    strip_parent_snapshot(&with_plugin)
}

fn position(reader: &Reader<&[u8]>) -> usize {
    usize::try_from(reader.buffer_position()).unwrap_or(usize::MAX)
}

fn path_is(path: &[Vec<u8>], expected: &[&[u8]]) -> bool {
    path.len() == expected.len()
        && path
            .iter()
            .zip(expected)
            .all(|(have, want)| have.as_slice() == *want)
}

/// Whether a `<plugin>` block's inner XML names the jacoco plugin.
fn is_jacoco_plugin(block: &str) -> bool {
    let mut reader = Reader::from_str(block);
    let mut depth = 0usize;
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.local_name().as_ref().to_vec();
                if depth == 0 && (name == b"groupId" || name == b"artifactId") {
                    let Ok(text) = reader.read_text(e.name()) else {
                        return false;
                    };
                    let text = text.trim();
                    if name == b"groupId" && text == "org.jacoco" {
                        return true;
                    }
                    if name == b"artifactId" && text == "jacoco-maven-plugin" {
                        return true;
                    }
                } else {
                    depth += 1;
                }
            }
            Ok(Event::End(_)) => depth = depth.saturating_sub(1),
            Ok(Event::Eof) | Err(_) => return false,
            Ok(_) => {}
        }
    }
}
