use crate::core::capability::{CapabilityKind, CapabilityRecord, JsonObject};
use serde_json::Value;

/// Explicitly populated set of capabilities, in registration order.
#[derive(Clone, Debug, Default)]
pub struct CapabilityRegistry {
    records: Vec<CapabilityRecord>,
}

/// Which namespace a record's name lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityClass {
    Tool,
    Resource,
    Prompt,
}

impl CapabilityClass {
    fn of(kind: &CapabilityKind) -> Self {
        match kind {
            CapabilityKind::Tool => CapabilityClass::Tool,
            CapabilityKind::ResourceTemplate { .. } | CapabilityKind::Context { .. } => {
                CapabilityClass::Resource
            }
            CapabilityKind::Prompt => CapabilityClass::Prompt,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CapabilityMeta {
    pub class: CapabilityClass,
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record. A record with the same class and name is replaced.
    pub fn register(&mut self, record: CapabilityRecord) -> &mut Self {
        let class = CapabilityClass::of(&record.kind);
        match self
            .records
            .iter()
            .position(|r| CapabilityClass::of(&r.kind) == class && r.name == record.name)
        {
            Some(i) => {
                tracing::warn!(name = record.name, "replacing already registered capability");
                self.records[i] = record;
            }
            None => {
                tracing::debug!(name = record.name, kind = ?record.kind, "capability registered");
                self.records.push(record);
            }
        }
        self
    }

    pub fn records(&self) -> impl Iterator<Item = &CapabilityRecord> {
        self.records.iter()
    }

    pub fn of_class(&self, class: CapabilityClass) -> impl Iterator<Item = &CapabilityRecord> {
        self.records
            .iter()
            .filter(move |r| CapabilityClass::of(&r.kind) == class)
    }

    pub fn find(&self, class: CapabilityClass, name: &str) -> Option<&CapabilityRecord> {
        self.of_class(class).find(|r| r.name == name)
    }

    /// Find the resource addressed by `uri` and extract its arguments from
    /// template path segments and the query string. Fixed context URIs win
    /// over templates.
    pub fn resolve_resource(&self, uri: &str) -> Option<(&CapabilityRecord, JsonObject)> {
        let path = uri.split(['?', '#']).next().unwrap_or(uri);
        self.records
            .iter()
            .find_map(|r| match r.kind {
                CapabilityKind::Context { uri: fixed } if fixed == path => Some((r, JsonObject::new())),
                _ => None,
            })
            .or_else(|| {
                self.records.iter().find_map(|r| match r.kind {
                    CapabilityKind::ResourceTemplate { uri_template } => {
                        match_template(uri_template, uri).map(|args| (r, args))
                    }
                    _ => None,
                })
            })
    }

    pub fn list(&self) -> Vec<CapabilityMeta> {
        self.records
            .iter()
            .map(|r| CapabilityMeta {
                class: CapabilityClass::of(&r.kind),
                name: r.name,
                description: r.description,
                input_schema: r.input_schema(),
            })
            .collect()
    }
}

/// Match `uri` against a `{name}`-style template. Captured segments are
/// percent-decoded; query-string pairs are added unless a path segment
/// already supplied that name.
fn match_template(template: &str, uri: &str) -> Option<JsonObject> {
    let uri = uri.split('#').next().unwrap_or(uri);
    let (path, query) = match uri.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (uri, None),
    };

    let t_segs: Vec<&str> = template.split('/').collect();
    let u_segs: Vec<&str> = path.split('/').collect();
    if t_segs.len() != u_segs.len() {
        return None;
    }

    let mut args = JsonObject::new();
    for (t, u) in t_segs.iter().zip(u_segs.iter()) {
        if let Some(name) = t.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            if u.is_empty() {
                return None;
            }
            let decoded = urlencoding::decode(u).ok()?;
            args.insert(name.to_owned(), Value::String(decoded.into_owned()));
        } else if t != u {
            return None;
        }
    }

    if let Some(q) = query {
        for (k, v) in url::form_urlencoded::parse(q.as_bytes()) {
            args.entry(k.into_owned()).or_insert(Value::String(v.into_owned()));
        }
    }
    Some(args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::capability::{CapabilityOutput, FnHandler, ParamSpec};
    use serde_json::json;

    fn echo(kind: CapabilityKind, name: &'static str) -> CapabilityRecord {
        CapabilityRecord::new(
            kind,
            name,
            "echo",
            vec![],
            FnHandler::new(|args| async move { Ok(CapabilityOutput::Json(Value::Object(args))) }),
        )
    }

    #[test]
    fn matches_templates_with_path_and_query() {
        let args = match_template(
            "solvedac://problems/search/{stub}",
            "solvedac://problems/search/_?query=tier%3As5..g5+tag%3Adp&page=2",
        )
        .unwrap();
        assert_eq!(args["stub"], "_");
        assert_eq!(args["query"], "tier:s5..g5 tag:dp");
        assert_eq!(args["page"], "2");
    }

    #[test]
    fn decodes_path_segments() {
        let args = match_template("solvedac://users/{handle}", "solvedac://users/a%20b").unwrap();
        assert_eq!(args["handle"], "a b");
    }

    #[test]
    fn rejects_non_matching_uris() {
        assert!(match_template("solvedac://users/{handle}", "solvedac://users/").is_none());
        assert!(match_template("solvedac://users/{handle}", "solvedac://users/a/b").is_none());
        assert!(match_template("solvedac://users/{handle}", "solvedac://people/a").is_none());
    }

    #[test]
    fn path_captures_win_over_query() {
        let args = match_template("solvedac://users/{handle}", "solvedac://users/a?handle=b").unwrap();
        assert_eq!(args["handle"], "a");
    }

    #[test]
    fn registers_lists_and_finds() {
        let mut reg = CapabilityRegistry::new();
        reg.register(echo(CapabilityKind::Tool, "test.echo"))
            .register(echo(CapabilityKind::Prompt, "test.echo"));
        let metas = reg.list();
        assert_eq!(metas.len(), 2);
        assert_eq!(metas[0].class, CapabilityClass::Tool);
        assert!(reg.find(CapabilityClass::Tool, "test.echo").is_some());
        assert!(reg.find(CapabilityClass::Prompt, "test.echo").is_some());
        assert!(reg.find(CapabilityClass::Resource, "test.echo").is_none());
    }

    #[test]
    fn same_name_same_class_replaces() {
        let mut reg = CapabilityRegistry::new();
        reg.register(echo(CapabilityKind::Tool, "t"));
        let mut rec = echo(CapabilityKind::Tool, "t");
        rec.params.push(ParamSpec::string("x", "x"));
        reg.register(rec);
        assert_eq!(reg.records().count(), 1);
        assert_eq!(reg.find(CapabilityClass::Tool, "t").unwrap().params.len(), 1);
    }

    #[tokio::test]
    async fn resolves_context_before_templates() {
        let mut reg = CapabilityRegistry::new();
        reg.register(echo(CapabilityKind::ResourceTemplate { uri_template: "solvedac://context/{name}" }, "any"));
        reg.register(echo(CapabilityKind::Context { uri: "solvedac://context/defaults" }, "defaults"));
        let (rec, args) = reg.resolve_resource("solvedac://context/defaults").unwrap();
        assert_eq!(rec.name, "defaults");
        assert!(args.is_empty());
        let (rec, args) = reg.resolve_resource("solvedac://context/other").unwrap();
        assert_eq!(rec.name, "any");
        let out = rec.invoke(&args).await.unwrap();
        assert_eq!(out, CapabilityOutput::Json(json!({})));
    }
}
