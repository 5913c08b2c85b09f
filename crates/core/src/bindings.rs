//! Schema-driven installation of proxy objects.
//!
//! One fixed-id schema fetch per context. Application namespaces land under the app root
//! (`go.<namespace>.<struct>`), each struct getting a stub per method and an accessor per field.
//! The reserved namespace lands under its own global (`strux.<sub>`) and holds methods only;
//! its stubs keep the short property name but call `<reserved>.<sub>.<method>` remotely.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info, warn};
use wvb_protocol::{BindingSchema, ReservedNamespaceSchema, StructSchema};
use wvb_runtime::ContextId;

use crate::backend::RemoteBackend;
use crate::config::BindingConfig;
use crate::context::ScriptContext;
use crate::error::Result;
use crate::field::FieldAccessor;
use crate::proxy::{Member, MethodStub, ProxyObject};

/// Counts of what one installation produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InstallReport {
	pub namespaces: usize,
	pub structs: usize,
	pub methods: usize,
	pub fields: usize,
	pub reserved_methods: usize,
}

/// Builds proxy graphs from binding schemas.
#[derive(Clone)]
pub struct BindingGenerator {
	backend: Arc<dyn RemoteBackend>,
	config: BindingConfig,
}

impl BindingGenerator {
	pub fn new(backend: Arc<dyn RemoteBackend>, config: BindingConfig) -> Self {
		Self { backend, config }
	}

	pub fn config(&self) -> &BindingConfig {
		&self.config
	}

	/// Fetches the schema and installs it into `context`.
	pub fn fetch_and_install(&self, context: &mut ScriptContext) -> Result<InstallReport> {
		let schema = self.backend.fetch_schema(&self.config.reserved_namespace)?;
		Ok(self.install(context, &schema))
	}

	/// Installs `schema` into `context`, replacing any previously generated roots.
	pub fn install(&self, context: &mut ScriptContext, schema: &BindingSchema) -> InstallReport {
		let mut report = InstallReport::default();
		let id = context.id();

		let mut app_root = ProxyObject::new();
		for (ns_name, structs) in &schema.namespaces {
			let mut namespace = ProxyObject::new();
			for (struct_name, members) in structs {
				let prefix = format!("{ns_name}.{struct_name}");
				namespace.insert(struct_name.clone(), Member::Object(self.build_struct(id, &prefix, members, &mut report)));
				report.structs += 1;
			}
			app_root.insert(ns_name.clone(), Member::Object(namespace));
			report.namespaces += 1;
		}

		let globals = context.globals_mut();
		globals.insert(self.config.app_root.clone(), Member::Object(app_root));

		if schema.reserved.is_empty() {
			globals.remove(&self.config.reserved_namespace);
		} else {
			let reserved = self.build_reserved(id, &schema.reserved, &mut report);
			globals.insert(self.config.reserved_namespace.clone(), Member::Object(reserved));
		}

		info!(
			target: "wvb.bindings",
			context = %id,
			namespaces = report.namespaces,
			structs = report.structs,
			methods = report.methods,
			fields = report.fields,
			reserved_methods = report.reserved_methods,
			"installed bindings"
		);
		report
	}

	fn build_struct(&self, context: ContextId, prefix: &str, schema: &StructSchema, report: &mut InstallReport) -> ProxyObject {
		let mut object = ProxyObject::new();
		debug!(
			target: "wvb.bindings",
			path = %prefix,
			methods = schema.methods.len(),
			fields = schema.fields.len(),
			"installing struct"
		);

		for method in &schema.methods {
			let remote = format!("{prefix}.{}", method.name);
			debug!(target: "wvb.bindings", method = %remote, params = ?method.param_types, "stub");
			let stub = MethodStub::new(remote, method.clone(), context, Arc::clone(&self.backend));
			object.insert(method.name.clone(), Member::Method(stub));
			report.methods += 1;
		}

		for field in &schema.fields {
			debug!(target: "wvb.bindings", path = %prefix, field = %field.name, type_tag = %field.type_tag, "field");
			let accessor = FieldAccessor::new(field, Arc::clone(&self.backend));
			if object.insert(field.name.clone(), Member::Field(accessor)).is_some() {
				warn!(target: "wvb.bindings", path = %prefix, field = %field.name, "field shadows a method of the same name");
			}
			report.fields += 1;
		}
		object
	}

	fn build_reserved(
		&self,
		context: ContextId,
		reserved: &BTreeMap<String, ReservedNamespaceSchema>,
		report: &mut InstallReport,
	) -> ProxyObject {
		let root = &self.config.reserved_namespace;
		let mut object = ProxyObject::new();
		for (sub, ns) in reserved {
			let mut namespace = ProxyObject::new();
			for method in &ns.methods {
				let remote = format!("{root}.{sub}.{}", method.name);
				debug!(target: "wvb.bindings", method = %remote, "reserved stub");
				let stub = MethodStub::new(remote, method.clone(), context, Arc::clone(&self.backend));
				namespace.insert(method.name.clone(), Member::Method(stub));
				report.reserved_methods += 1;
			}
			object.insert(sub.clone(), Member::Object(namespace));
		}
		object
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;
	use wvb_protocol::ScriptValue;

	use super::*;
	use crate::testing::FakeBackend;

	fn schema() -> serde_json::Value {
		json!({
			"main": {
				"App": {
					"methods": [
						{ "name": "Greet", "paramCount": 1, "paramTypes": ["string"] },
						{ "name": "Save" }
					],
					"fields": [{ "name": "Count", "type": "int32" }]
				}
			},
			"util": {},
			"strux": {
				"boot": { "methods": [{ "name": "Ready" }] }
			}
		})
	}

	fn generator(backend: &Arc<FakeBackend>) -> BindingGenerator {
		BindingGenerator::new(backend.clone(), BindingConfig::default())
	}

	#[test]
	fn graph_has_exactly_the_declared_members() {
		let backend = FakeBackend::with_schema(schema());
		let mut ctx = ScriptContext::new();

		let report = generator(&backend).fetch_and_install(&mut ctx).unwrap();
		assert_eq!(
			report,
			InstallReport {
				namespaces: 2,
				structs: 1,
				methods: 2,
				fields: 1,
				reserved_methods: 1,
			}
		);

		let globals = ctx.globals();
		assert_eq!(globals.object_names(), vec!["go", "strux"]);

		let go = globals.get("go").and_then(Member::as_object).unwrap();
		assert_eq!(go.object_names(), vec!["main", "util"]);
		assert!(go.resolve(["util"]).and_then(Member::as_object).unwrap().is_empty());

		let app = ctx.lookup("go.main.App").unwrap().as_object().unwrap();
		assert_eq!(app.method_names(), vec!["Greet", "Save"]);
		assert_eq!(app.field_names(), vec!["Count"]);
		assert_eq!(app.len(), 3);

		let greet = ctx.lookup("go.main.App.Greet").unwrap().as_method().unwrap();
		assert_eq!(greet.remote_name(), "main.App.Greet");
		assert_eq!(greet.schema().param_count, Some(1));

		let count = ctx.lookup("go.main.App.Count").unwrap().as_field().unwrap();
		assert_eq!(count.declared_type(), "int32");
	}

	#[test]
	fn reserved_methods_keep_short_names_and_prefixed_remote_names() {
		let backend = FakeBackend::with_schema(schema());
		let mut ctx = ScriptContext::new();
		generator(&backend).fetch_and_install(&mut ctx).unwrap();

		let ready = ctx.lookup("strux.boot.Ready").unwrap().as_method().unwrap();
		assert_eq!(ready.remote_name(), "strux.boot.Ready");
		assert!(ctx.lookup("go.strux").is_err());
	}

	#[test]
	fn schema_is_fetched_with_one_request() {
		let backend = FakeBackend::with_schema(schema());
		let mut ctx = ScriptContext::new();
		generator(&backend).fetch_and_install(&mut ctx).unwrap();

		assert_eq!(backend.requests(), vec![("__getBindings".to_string(), vec![])]);
	}

	#[tokio::test]
	async fn stubs_carry_the_installing_context() {
		let backend = FakeBackend::with_schema(schema());
		let mut ctx = ScriptContext::new();
		generator(&backend).fetch_and_install(&mut ctx).unwrap();

		let pending = ctx.call("go.main.App.Greet", &[ScriptValue::from("world")]).unwrap();
		assert_eq!(pending.context(), ctx.id());
		assert_eq!(pending.await.unwrap(), ScriptValue::from("main.App.Greet"));
	}

	#[test]
	fn reinstall_replaces_previous_roots() {
		let backend = FakeBackend::with_schema(schema());
		let mut ctx = ScriptContext::new();
		let generator = generator(&backend);
		generator.fetch_and_install(&mut ctx).unwrap();

		let smaller = BindingSchema::from_value(json!({ "main": { "App": { "methods": [] } } }), "strux").unwrap();
		generator.install(&mut ctx, &smaller);

		assert!(ctx.lookup("go.main.App.Greet").is_err());
		assert!(ctx.lookup("go.main.App").is_ok());
		assert!(ctx.lookup("strux").is_err());
	}

	#[test]
	fn path_errors_name_the_member() {
		let backend = FakeBackend::with_schema(schema());
		let mut ctx = ScriptContext::new();
		generator(&backend).fetch_and_install(&mut ctx).unwrap();

		assert!(matches!(ctx.call("go.main.App.Count", &[]), Err(crate::Error::NotCallable(_))));
		assert!(matches!(ctx.get("go.main.App.Greet"), Err(crate::Error::NotAField(_))));
		assert!(matches!(ctx.get("go.main.Other"), Err(crate::Error::UnknownMember(_))));
		assert!(matches!(ctx.lookup(""), Err(crate::Error::UnknownMember(_))));
	}
}
