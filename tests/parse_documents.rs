use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use raml_parser::{
    APIType, AUTO_GENERATED, CacheKey, CheckValueOptions, DiskCache, DocumentCache, Error, MemoryFiles, NativeType,
    Parser, ParserConfig, Result, RootDocument, Value,
};
use serde_json::json;

const USERS_API: &str = r#"#%RAML 1.0
title: Example from type
mediaType: application/json
types:
  User:
    type: object
    properties:
      name: string
      email: string
    examples:
      user1:
        name: Alice
        email: alice@example.com
      user2:
        name: Bob
        email: bob@example.com
/user:
  get:
    responses:
      200:
        body:
          type: User
/user/wrap:
  get:
    responses:
      200:
        body:
          application/json:
            type: object
            properties:
              user: User
/users:
  get:
    responses:
      200:
        body:
          application/json:
            type: User[]
/users/wrap:
  get:
    responses:
      200:
        body:
          application/json:
            properties:
              users: User[]
/users/{id}:
  get:
"#;

const ORDERS_API: &str = r#"#%RAML 1.0
title: Orders
mediaType: application/json
uses:
  assets: libraries/assets.raml
/orders:
  get:
    is: [ assets.paged ]
    responses:
      200:
        body:
          type: assets.Order[]
"#;

const ASSETS_LIBRARY: &str = r#"#%RAML 1.0 Library
usage: Shared order types
annotationTypes:
  internal:
    allowedTargets: TypeDeclaration
types:
  Order:
    type: object
    (internal):
    properties:
      id: integer
      note?: string
    example:
      id: 1
traits:
  paged:
    queryParameters:
      page?: integer
"#;

const ANNOTATED_API: &str = r#"#%RAML 1.0
title: Annotations
annotationTypes:
  UsedAnnotation:
    description: used annotation
  UnusedAnnotation:
    description: unused annotation
/get:
  (UsedAnnotation): hello
  get:
"#;

fn parse_text(text: &str) -> Result<RootDocument> {
    Parser::new().with_source(MemoryFiles::new()).parse_data(text.as_bytes(), ".")
}

fn parse_text_with(config: ParserConfig, text: &str) -> Result<RootDocument> {
    Parser::new().with_config(config).with_source(MemoryFiles::new()).parse_data(text.as_bytes(), ".")
}

fn response_body<'a>(doc: &'a RootDocument, path: &str, media_type: &str) -> &'a APIType {
    let resource = doc.find_resource(path).unwrap_or_else(|| panic!("resource {path}"));
    &resource.methods["get"].responses[&200].bodies[media_type]
}

fn example_value(api: &APIType) -> Option<Value> {
    api.declaration.example.as_ref().and_then(|example| example.value.clone())
}

fn orders_files() -> MemoryFiles {
    MemoryFiles::new().with("api/api.raml", ORDERS_API).with("api/libraries/assets.raml", ASSETS_LIBRARY)
}

// ————————————————————————————————————————————————————————————————————————————
// TYPES & PROPERTIES
// ————————————————————————————————————————————————————————————————————————————

#[test]
fn example_missing_a_required_property_is_rejected() {
    let err = parse_text(
        "#%RAML 1.0\ntitle: Users\ntypes:\n  User:\n    type: object\n    properties:\n      name: string\n      email: string\n    example:\n      name: Alice\n",
    )
    .unwrap_err();
    match err {
        Error::RequiredProperty { property, owner } => {
            assert_eq!(property, "email");
            assert_eq!(owner, "object");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn question_mark_makes_a_property_optional() {
    let doc = parse_text(
        "#%RAML 1.0\ntitle: Orgs\ntypes:\n  Org:\n    type: object\n    properties:\n      name: string\n      address?: string\n",
    )
    .unwrap();
    let properties = doc.library.types["Org"].properties();
    assert_eq!(properties.keys().collect::<Vec<_>>(), ["name", "address"], "order kept, suffix stripped");
    assert!(properties["name"].required);
    assert!(!properties["address"].required, "address? is optional");
    assert_eq!(properties["address"].name, "address");
}

#[test]
fn forward_and_chained_references_resolve() {
    let doc = parse_text(
        "#%RAML 1.0\ntitle: Chain\ntypes:\n  Admin: Person\n  Person: Named\n  Named:\n    properties:\n      name: string\n",
    )
    .unwrap();
    let admin = &doc.library.types["Admin"];
    assert_eq!(admin.type_name(), "Person", "declared name is kept");
    assert_eq!(admin.native_type, NativeType::Object);
    assert!(admin.properties().contains_key("name"), "inherited through two links");
}

#[test]
fn base_type_cycle_is_an_error() {
    let err = parse_text("#%RAML 1.0\ntitle: Cycle\ntypes:\n  A: B\n  B: A\n").unwrap_err();
    match err {
        Error::CyclicType { name, chain } => {
            assert_eq!(name, "A");
            assert_eq!(chain, ["A", "B", "A"]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn recursion_through_a_property_is_allowed() {
    let doc = parse_text(
        "#%RAML 1.0\ntitle: List\ntypes:\n  Node:\n    type: object\n    properties:\n      value?: string\n      next?: Node\n",
    )
    .unwrap();
    let next = &doc.library.types["Node"].properties()["next"];
    assert_eq!(next.api_type.type_name(), "Node");
    assert!(!next.required);
}

#[test]
fn undefined_type_is_reported() {
    let err = parse_text("#%RAML 1.0\ntitle: Missing\ntypes:\n  User:\n    properties:\n      org: Org\n").unwrap_err();
    assert!(matches!(err, Error::TypeUndefined { ref name } if name == "Org"), "got {err}");
}

#[test]
fn custom_scalar_type_is_inherited_and_checked() {
    let api = "#%RAML 1.0\ntitle: Accounts\ntypes:\n  Username:\n    type: string\n    minLength: 3\n  Account:\n    properties:\n      username: Username\n    example:\n      username: EXAMPLE\n";
    let doc = parse_text(&api.replace("EXAMPLE", "alice")).unwrap();
    let username = &doc.library.types["Account"].properties()["username"].api_type;
    assert_eq!(username.native_type, NativeType::String);
    assert_eq!(username.string.min_length, 3);

    let err = parse_text(&api.replace("EXAMPLE", "42")).unwrap_err();
    match err {
        Error::PropertyTypeMismatch { property, expected, .. } => {
            assert_eq!(property.as_deref(), Some("username"));
            assert_eq!(expected, "Username");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn integral_number_example_needs_the_option() {
    let api = "#%RAML 1.0\ntitle: Counts\ntypes:\n  Count:\n    properties:\n      count: integer\n    example:\n      count: 1.0\n";
    assert!(matches!(parse_text(api), Err(Error::PropertyTypeMismatch { .. })));

    let options = CheckValueOptions::default().allow_integer_to_be_number(true);
    let config = ParserConfig::default().check_value_options(options);
    assert!(parse_text_with(config, api).is_ok());
}

// ————————————————————————————————————————————————————————————————————————————
// RESOURCES, BODIES, TRAITS
// ————————————————————————————————————————————————————————————————————————————

#[test]
fn uri_parameters_are_synthesized() {
    let doc = parse_text(USERS_API).unwrap();
    let user = doc.find_resource("/users/{id}").unwrap();
    assert!(user.uri_parameters.contains_key("id"), "declared from the path");
    assert!(doc.resources["/users"].uri_parameters.is_empty());

    let nested = parse_text("#%RAML 1.0\ntitle: Nested\n/users:\n  /{userId}:\n    get:\n").unwrap();
    assert!(nested.find_resource("/users/{userId}").unwrap().uri_parameters.contains_key("userId"));
}

#[test]
fn base_uri_parameters_are_decoded() {
    let doc = parse_text(
        "#%RAML 1.0\ntitle: Amazon S3 REST API\nversion: 1\nbaseUri: https://{bucketName}.s3.amazonaws.com\nbaseUriParameters:\n  bucketName:\n    description: The name of the bucket\n",
    )
    .unwrap();
    assert_eq!(doc.version, "1");
    assert_eq!(doc.base_uri, "https://{bucketName}.s3.amazonaws.com");
    assert_eq!(doc.base_uri_parameters["bucketName"].api_type.declaration.description, "The name of the bucket");
}

#[test]
fn bare_body_takes_the_default_media_type() {
    let doc = parse_text(USERS_API).unwrap();
    let bodies = &doc.resources["/user"].methods["get"].responses[&200].bodies;
    assert_eq!(bodies.keys().collect::<Vec<_>>(), ["application/json"]);
}

#[test]
fn bare_body_without_default_media_type_fails() {
    let err = parse_text("#%RAML 1.0\ntitle: Bodies\n/a:\n  post:\n    body:\n      type: string\n").unwrap_err();
    assert!(matches!(err, Error::MissingDefaultMediaType), "got {err}");
}

#[test]
fn misspelled_method_key_is_a_typo() {
    let err = parse_text(
        "#%RAML 1.0\ntitle: Typo\n/get/error:\n  get:\n    response:\n      200:\n        body:\n          application/json:\n            type: string\n",
    )
    .unwrap_err();
    assert!(matches!(err, Error::Typo { ref key, .. } if key == "response"), "got {err}");
}

#[test]
fn trait_usage_is_filled_and_keeps_its_name() {
    let doc = parse_text(
        "#%RAML 1.0\ntitle: Traits\ntraits:\n  RequireLogin:\n    headers:\n      Authorization: string\n/user:\n  get:\n    is: [ RequireLogin ]\n",
    )
    .unwrap();
    let declared = &doc.library.traits["RequireLogin"];
    assert_eq!(declared.method.headers["Authorization"].api_type.native_type, NativeType::String);

    let usages = &doc.resources["/user"].methods["get"].is;
    assert_eq!(usages.len(), 1);
    assert_eq!(usages[0].reference, "RequireLogin");
    assert_eq!(usages[0].method.headers["Authorization"].api_type.native_type, NativeType::String);
}

#[test]
fn unknown_trait_is_reported() {
    let err = parse_text("#%RAML 1.0\ntitle: Traits\n/user:\n  get:\n    is: [ missing ]\n").unwrap_err();
    assert!(matches!(err, Error::TraitUndefined { ref name } if name == "missing"), "got {err}");
}

#[test]
fn unused_trait_fails_unless_ignored() {
    let api = "#%RAML 1.0\ntitle: Traits\ntraits:\n  paged:\n    queryParameters:\n      page?: integer\n/user:\n  get:\n";
    let err = parse_text(api).unwrap_err();
    assert!(matches!(err, Error::UnusedTrait { ref names } if names == &["paged".to_string()]), "got {err}");
    assert!(parse_text_with(ParserConfig::default().ignore_unused_trait(true), api).is_ok());
}

// ————————————————————————————————————————————————————————————————————————————
// ANNOTATIONS
// ————————————————————————————————————————————————————————————————————————————

#[test]
fn unused_annotation_fails_unless_ignored() {
    let err = parse_text(ANNOTATED_API).unwrap_err();
    assert!(
        matches!(err, Error::UnusedAnnotation { ref names } if names == &["UnusedAnnotation".to_string()]),
        "got {err}"
    );

    let doc = parse_text_with(ParserConfig::default().ignore_unused_annotation(true), ANNOTATED_API).unwrap();
    let applied = &doc.resources["/get"].annotations["UsedAnnotation"];
    assert_eq!(applied.value, Some(Value::from("hello")));
    let declared = applied.annotation_type.as_ref().expect("linked to its declaration");
    assert_eq!(declared.api_type.declaration.description, "used annotation");
    assert_eq!(declared.api_type.native_type, NativeType::String, "no type means string");
}

#[test]
fn annotation_outside_its_allowed_targets_fails() {
    let api = "#%RAML 1.0\ntitle: Targets\nannotationTypes:\n  onlyMethods:\n    allowedTargets: Method\n/a:\nPLACEMENT";
    let on_resource = api.replace("PLACEMENT", "  (onlyMethods):\n  get:\n");
    let err = parse_text(&on_resource).unwrap_err();
    assert!(
        matches!(err, Error::AnnotationTargetNotAllowed { ref name, ref target } if name == "onlyMethods" && target == "Resource"),
        "got {err}"
    );

    let on_method = api.replace("PLACEMENT", "  get:\n    (onlyMethods):\n");
    assert!(parse_text(&on_method).is_ok());
}

#[test]
fn undeclared_annotation_is_reported() {
    let err = parse_text("#%RAML 1.0\ntitle: Annotations\n(missing): 1\n").unwrap_err();
    assert!(matches!(err, Error::AnnotationUndefined { ref name } if name == "missing"), "got {err}");
}

// ————————————————————————————————————————————————————————————————————————————
// EXAMPLES
// ————————————————————————————————————————————————————————————————————————————

#[test]
fn examples_are_generated_from_referenced_types() {
    let doc = parse_text(USERS_API).unwrap();
    let alice = json!({"name": "Alice", "email": "alice@example.com"});
    let bob = json!({"name": "Bob", "email": "bob@example.com"});

    let user = response_body(&doc, "/user", "application/json");
    assert_eq!(user.type_name(), "User");
    assert_eq!(example_value(user), Some(Value::from(alice.clone())), "first example of the base type");

    let wrap = response_body(&doc, "/user/wrap", "application/json");
    assert_eq!(wrap.properties()["user"].api_type.type_name(), "User");
    assert_eq!(example_value(wrap), Some(Value::from(json!({"user": alice.clone()}))));
    let generated = wrap.declaration.examples.get(AUTO_GENERATED).expect("autoGenerated entry");
    assert_eq!(generated.value, example_value(wrap));

    let users = response_body(&doc, "/users", "application/json");
    assert_eq!(users.type_name(), "User[]");
    assert_eq!(example_value(users), Some(Value::from(json!([alice.clone(), bob.clone()]))), "every base example");

    let users_wrap = response_body(&doc, "/users/wrap", "application/json");
    assert_eq!(users_wrap.native_type, NativeType::Object);
    assert_eq!(example_value(users_wrap), Some(Value::from(json!({"users": [alice, bob]}))));
}

#[test]
fn generated_examples_pass_the_validator() {
    let doc = parse_text(USERS_API).unwrap();
    for path in ["/user", "/user/wrap", "/users", "/users/wrap"] {
        let body = response_body(&doc, path, "application/json");
        let value = example_value(body).unwrap_or_else(|| panic!("example for {path}"));
        raml_parser::check_value_api_type(body, &value, &CheckValueOptions::default())
            .unwrap_or_else(|e| panic!("{path}: {e}"));
    }
}

#[test]
fn declared_examples_are_not_replaced() {
    let doc = parse_text(USERS_API).unwrap();
    let user = &doc.library.types["User"];
    assert!(user.declaration.example.is_none());
    assert_eq!(user.declaration.examples.keys().collect::<Vec<_>>(), ["user1", "user2"]);
}

#[test]
fn binary_include_is_read_as_bytes() {
    let png = vec![0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];
    let files = MemoryFiles::new()
        .with(
            "api/api.raml",
            "#%RAML 1.0\ntitle: Example include binary file\n/binary:\n  get:\n    responses:\n      200:\n        body:\n          image/png:\n            type: file\n            fileTypes: ['*/*']\n            example: !include logo.png\n",
        )
        .with("api/logo.png", png.clone());
    let doc = Parser::new().with_source(files).parse_file("api/api.raml").unwrap();

    let body = response_body(&doc, "/binary", "image/png");
    assert_eq!(body.native_type, NativeType::File);
    assert_eq!(body.file.file_types, ["*/*"]);
    assert_eq!(example_value(body), Some(Value::Binary(png)));
    assert!(body.declaration.example.as_ref().is_some_and(|e| e.include_tag));
}

// ————————————————————————————————————————————————————————————————————————————
// LIBRARIES
// ————————————————————————————————————————————————————————————————————————————

#[test]
fn library_is_loaded_relative_to_the_document() {
    let doc = Parser::new().with_source(orders_files()).parse_file("api/api.raml").unwrap();

    let order = doc.library.get_type("assets.Order").expect("qualified lookup");
    assert_eq!(order.native_type, NativeType::Object);
    assert!(!order.properties()["note"].required);
    assert!(order.declaration.annotations["internal"].annotation_type.is_some());

    let method = &doc.resources["/orders"].methods["get"];
    assert_eq!(method.is[0].reference, "assets.paged");
    assert!(!method.is[0].method.query_parameters["page"].required);

    let body = response_body(&doc, "/orders", "application/json");
    assert_eq!(example_value(body), Some(Value::from(json!([{"id": 1}]))));
}

#[test]
fn unused_library_trait_is_reported_with_its_namespace() {
    let files = MemoryFiles::new()
        .with("api/api.raml", ORDERS_API.replace("    is: [ assets.paged ]\n", ""))
        .with("api/libraries/assets.raml", ASSETS_LIBRARY);
    let err = Parser::new().with_source(files).parse_file("api/api.raml").unwrap_err();
    assert!(matches!(err, Error::UnusedTrait { ref names } if names == &["assets.paged".to_string()]), "got {err}");
}

#[test]
fn unused_library_annotation_is_reported_with_its_namespace() {
    let library = ASSETS_LIBRARY.replace("annotationTypes:\n", "annotationTypes:\n  audited:\n    description: never applied\n");
    let files = MemoryFiles::new().with("api/api.raml", ORDERS_API).with("api/libraries/assets.raml", library);
    let err = Parser::new().with_source(files.clone()).parse_file("api/api.raml").unwrap_err();
    assert!(
        matches!(err, Error::UnusedAnnotation { ref names } if names == &["assets.audited".to_string()]),
        "got {err}"
    );

    let config = ParserConfig::default().ignore_unused_annotation(true);
    assert!(Parser::new().with_config(config).with_source(files).parse_file("api/api.raml").is_ok());
}

#[test]
fn library_include_resolves_against_the_library_directory() {
    let png = vec![0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];
    let files = MemoryFiles::new()
        .with(
            "api/api.raml",
            "#%RAML 1.0\ntitle: Logos\nuses:\n  assets: libs/assets.raml\n/logo:\n  get:\n    responses:\n      200:\n        body:\n          image/png:\n            type: assets.Logo\n",
        )
        .with("api/libs/assets.raml", "#%RAML 1.0 Library\ntypes:\n  Logo:\n    type: file\n    example: !include logo.png\n")
        .with("api/libs/logo.png", png.clone());
    let doc = Parser::new().with_source(files).parse_file("api/api.raml").unwrap();

    let logo = doc.library.get_type("assets.Logo").expect("qualified lookup");
    assert_eq!(example_value(logo), Some(Value::Binary(png.clone())));
    let body = response_body(&doc, "/logo", "image/png");
    assert_eq!(body.native_type, NativeType::File);
    assert_eq!(example_value(body), Some(Value::Binary(png)), "derived from the library type");
}

#[test]
fn missing_library_file_names_the_path() {
    let files = MemoryFiles::new().with("api/api.raml", ORDERS_API);
    let err = Parser::new().with_source(files).parse_file("api/api.raml").unwrap_err();
    match err {
        Error::LibraryLoad { path, .. } => assert_eq!(path, Path::new("api/libraries/assets.raml")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn standalone_library_is_resolved() {
    let config = ParserConfig::default().ignore_unused_trait(true).check_raml_version(true);
    let library = Parser::new()
        .with_config(config)
        .with_source(MemoryFiles::new())
        .parse_library_data(ASSETS_LIBRARY.as_bytes(), ".")
        .unwrap();
    assert_eq!(library.usage, "Shared order types");
    assert_eq!(library.get_type("Order").map(|t| t.native_type.clone()), Some(NativeType::Object));
}

// ————————————————————————————————————————————————————————————————————————————
// SOURCES, VERSION, CACHE
// ————————————————————————————————————————————————————————————————————————————

#[test]
fn version_line_is_checked_only_when_configured() {
    let old = "#%RAML 0.8\ntitle: Old\n";
    assert_eq!(parse_text(old).unwrap().title, "Old");
    let err = parse_text_with(ParserConfig::default().check_raml_version(true), old).unwrap_err();
    assert!(matches!(err, Error::UnexpectedRamlVersion { .. }), "got {err}");
}

#[test]
fn yaml_syntax_error_is_reported_with_its_line() {
    let err = parse_text("#%RAML 1.0\ntitle: [unclosed\n").unwrap_err();
    assert!(matches!(err, Error::Yaml { line, .. } if line > 0), "got {err}");
}

#[test]
fn directory_is_parsed_as_one_document() {
    let files = MemoryFiles::new()
        .with("split/1-header.raml", "#%RAML 1.0\ntitle: Split")
        .with("split/2-resources.raml", "/users:\n  get:\n    description: list users")
        .with("split/notes.txt", "ignored");
    let doc = Parser::new().with_source(files).parse_file("split").unwrap();
    assert_eq!(doc.title, "Split");
    assert_eq!(doc.resources["/users"].methods["get"].description, "list users");
    assert_eq!(doc.working_directory, Path::new("split"));
}

#[test]
fn local_files_are_read_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("libraries")).unwrap();
    std::fs::write(dir.path().join("api.raml"), ORDERS_API).unwrap();
    std::fs::write(dir.path().join("libraries/assets.raml"), ASSETS_LIBRARY).unwrap();
    let doc = Parser::new().parse_file(dir.path().join("api.raml")).unwrap();
    assert_eq!(doc.title, "Orders");
    assert_eq!(doc.working_directory, dir.path());
}

struct CountingCache {
    inner: DiskCache,
    hits: Arc<AtomicUsize>,
}

impl DocumentCache for CountingCache {
    fn load(&self, key: &CacheKey) -> Result<Option<RootDocument>> {
        let found = self.inner.load(key)?;
        if found.is_some() {
            self.hits.fetch_add(1, Ordering::SeqCst);
        }
        Ok(found)
    }

    fn store(&self, key: &CacheKey, document: &RootDocument) -> Result<()> {
        self.inner.store(key, document)
    }
}

#[test]
fn cached_document_matches_a_fresh_parse() {
    let dir = tempfile::tempdir().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let parser = |files: MemoryFiles| {
        Parser::new()
            .with_source(files)
            .with_cache(CountingCache { inner: DiskCache::new(dir.path()), hits: Arc::clone(&hits) })
    };

    let files = MemoryFiles::new().with("api.raml", USERS_API);
    let fresh = parser(files.clone()).parse_file("api.raml").unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 0, "first parse misses");
    assert!(DiskCache::new(dir.path()).entry_path(&CacheKey::new(Path::new("api.raml"), USERS_API.as_bytes())).exists());

    let cached = parser(files).parse_file("api.raml").unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 1, "second parse hits");
    assert_eq!(serde_json::to_value(&cached).unwrap(), serde_json::to_value(&fresh).unwrap());
    let user = &cached.library.types["User"];
    assert_eq!(user.native_type, NativeType::Object);
    assert!(user.properties()["email"].required);
    assert_eq!(user.properties()["email"].name, "email", "names restored");

    let changed = MemoryFiles::new().with("api.raml", USERS_API.replace("Example from type", "Changed"));
    let reparsed = parser(changed).parse_file("api.raml").unwrap();
    assert_eq!(reparsed.title, "Changed");
    assert_eq!(hits.load(Ordering::SeqCst), 1, "changed content misses");
}

#[test]
fn library_edits_do_not_invalidate_the_root_entry() {
    let dir = tempfile::tempdir().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let parser = |files: MemoryFiles| {
        Parser::new()
            .with_source(files)
            .with_cache(CountingCache { inner: DiskCache::new(dir.path()), hits: Arc::clone(&hits) })
    };

    let first = parser(orders_files()).parse_file("api/api.raml").unwrap();
    let edited = MemoryFiles::new()
        .with("api/api.raml", ORDERS_API)
        .with("api/libraries/assets.raml", ASSETS_LIBRARY.replace("id: 1", "id: 2"));
    let second = parser(edited).parse_file("api/api.raml").unwrap();

    assert_eq!(hits.load(Ordering::SeqCst), 1, "keyed on the root file only");
    let body = response_body(&second, "/orders", "application/json");
    assert_eq!(example_value(body), Some(Value::from(json!([{"id": 1}]))), "stored document returned");
    assert_eq!(serde_json::to_value(&second).unwrap(), serde_json::to_value(&first).unwrap());
}

#[test]
fn configured_cache_directory_enables_the_disk_cache() {
    let dir = tempfile::tempdir().unwrap();
    let cache_dir = dir.path().join("cache");
    let files = MemoryFiles::new().with("api.raml", ANNOTATED_API);
    let config = ParserConfig::default().ignore_unused_annotation(true).cache_directory(&cache_dir);
    let parser = Parser::new().with_config(config).with_source(files);

    let fresh = parser.parse_file("api.raml").unwrap();
    assert!(cache_dir.read_dir().unwrap().next().is_some(), "entry written");
    let cached = parser.parse_file("api.raml").unwrap();
    let applied = &cached.resources["/get"].annotations["UsedAnnotation"];
    assert!(applied.annotation_type.is_some(), "annotation relinked after loading");
    assert_eq!(serde_json::to_value(&cached).unwrap(), serde_json::to_value(&fresh).unwrap());
}
