//! Directory flows against a mock API server: dispatch, apply, reconcile.

use chrono::Utc;
use conship_states::StateCtx;
use ustr::Ustr;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use conship_business::users::{
    CreateUserCache, CreateUserCommand, CreateUserInput, CreateUserRequest, DirectoryState,
    FetchManagedUsersCommand, ModuleGrant, ModuleId, RequestPhase, Role, UpdateModulesCache,
    UpdateModulesCommand, UpdateModulesInput, UsersFetchCache, reconcile_directory,
};
use conship_business::{NotificationKind, SessionConfig};

const TOKEN: &str = "tok-1";

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn admin_user() -> serde_json::Value {
    serde_json::json!({
        "_id": "u-0",
        "name": "Root",
        "email": "root@conship.example",
        "role": "system_admin",
        "active": true
    })
}

fn setup_ctx(api_base_url: &str) -> StateCtx {
    let mut ctx = StateCtx::new();
    ctx.add_state(SessionConfig {
        api_base_url: api_base_url.to_string(),
        dark_mode: false,
        user: serde_json::from_value(admin_user()).ok(),
        token: Some(TOKEN.to_string()),
    });
    ctx.add_state(DirectoryState::new());
    ctx.add_state(UsersFetchCache::default());
    ctx.add_state(CreateUserCache::default());
    ctx.add_state(UpdateModulesCache::default());
    ctx.add_state(CreateUserInput::default());
    ctx.add_state(UpdateModulesInput::default());
    ctx.record_command(FetchManagedUsersCommand);
    ctx.record_command(CreateUserCommand);
    ctx.record_command(UpdateModulesCommand);
    ctx
}

fn managed_users_body() -> serde_json::Value {
    serde_json::json!({
        "users": [
            {
                "_id": "c-1",
                "name": "Acme Logistics",
                "email": "ops@acme.example",
                "role": "customer",
                "active": true
            },
            {
                "_id": "c-2",
                "name": "Bob",
                "email": "bob@acme.example",
                "role": "customer_user",
                "active": true,
                "parentAccountId": "c-1"
            },
            {
                "_id": "p-1",
                "name": "Nordwind GmbH",
                "email": "kontakt@nordwind.example",
                "role": "foreign_partner",
                "active": false
            }
        ]
    })
}

async fn mount_managed_users(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/users/managed"))
        .and(header("authorization", format!("Bearer {TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(managed_users_body()))
        .mount(server)
        .await;
}

#[tokio::test]
async fn initial_fetch_builds_hierarchy() {
    init_logger();
    let server = MockServer::start().await;
    mount_managed_users(&server).await;

    let mut ctx = setup_ctx(&server.uri());
    ctx.dispatch_and_sync::<FetchManagedUsersCommand>().await;

    let refresh = reconcile_directory(&mut ctx, Utc::now());
    assert!(!refresh);

    let directory = ctx.state::<DirectoryState>();
    assert!(!directory.is_loading());
    let users = directory.users();
    assert_eq!(users.len(), 2);
    assert_eq!(users[0].account.id, Ustr::from("c-1"));
    assert_eq!(users[0].sub_users.len(), 1);
    assert_eq!(users[0].sub_users[0].id, Ustr::from("c-2"));
    assert!(users[1].sub_users.is_empty());

    let stats = directory.stats();
    assert_eq!(stats.total_users, 3);
    assert_eq!(stats.organizations, 2);
    assert_eq!(stats.active, 1);
}

#[tokio::test]
async fn failed_refresh_keeps_previous_list() {
    init_logger();
    let server = MockServer::start().await;
    let five_users = serde_json::json!({
        "users": [
            {"_id": "c-1", "name": "Acme Logistics", "email": "ops@acme.example", "role": "customer", "active": true},
            {"_id": "c-2", "name": "Bob", "email": "bob@acme.example", "role": "customer_user", "active": true, "parentAccountId": "c-1"},
            {"_id": "c-3", "name": "Eve", "email": "eve@acme.example", "role": "customer_user", "active": true, "parentAccountId": "c-1"},
            {"_id": "p-1", "name": "Nordwind GmbH", "email": "kontakt@nordwind.example", "role": "foreign_partner", "active": true},
            {"_id": "e-1", "name": "Carla", "email": "carla@conship.example", "role": "conship_employee", "active": true}
        ]
    });
    Mock::given(method("GET"))
        .and(path("/api/users/managed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(five_users))
        .mount(&server)
        .await;

    let mut ctx = setup_ctx(&server.uri());
    ctx.dispatch_and_sync::<FetchManagedUsersCommand>().await;
    let _ = reconcile_directory(&mut ctx, Utc::now());
    assert_eq!(ctx.state::<DirectoryState>().stats().total_users, 5);

    // The server starts failing; the refresh must not clear the view.
    server.reset().await;
    Mock::given(method("GET"))
        .and(path("/api/users/managed"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    ctx.dispatch_and_sync::<FetchManagedUsersCommand>().await;
    let now = Utc::now();
    let refresh = reconcile_directory(&mut ctx, now);
    assert!(!refresh);

    let directory = ctx.state::<DirectoryState>();
    assert_eq!(directory.stats().total_users, 5);
    assert!(!directory.is_loading());
    let notification = directory.notification().unwrap();
    assert_eq!(notification.kind, NotificationKind::Error);
    assert_eq!(notification.message, "Failed to fetch users");

    // The notification dismisses itself after its display window.
    let _ = reconcile_directory(&mut ctx, now + chrono::Duration::seconds(3));
    assert!(ctx.state::<DirectoryState>().notification().is_none());
}

#[tokio::test]
async fn create_success_closes_form_and_refreshes() {
    init_logger();
    let server = MockServer::start().await;
    mount_managed_users(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/users"))
        .and(header("authorization", format!("Bearer {TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut ctx = setup_ctx(&server.uri());
    assert!(ctx.state_mut::<DirectoryState>().open_create_form(Role::SystemAdmin));
    ctx.state_mut::<CreateUserInput>().request = Some(CreateUserRequest {
        name: "New Customer".to_string(),
        email: "new@customer.example".to_string(),
        password: "hunter2".to_string(),
        role: Role::Customer,
    });

    ctx.dispatch_and_sync::<CreateUserCommand>().await;
    let refresh = reconcile_directory(&mut ctx, Utc::now());
    assert!(refresh);

    {
        let directory = ctx.state::<DirectoryState>();
        assert!(directory.create_form().is_none());
        let notification = directory.notification().unwrap();
        assert_eq!(notification.kind, NotificationKind::Success);
        assert_eq!(notification.message, "User created successfully");
    }

    // The follow-up refresh the reconcile asked for.
    ctx.dispatch_and_sync::<FetchManagedUsersCommand>().await;
    let _ = reconcile_directory(&mut ctx, Utc::now());
    assert_eq!(ctx.state::<DirectoryState>().users().len(), 2);
}

#[tokio::test]
async fn create_failure_keeps_form_and_surfaces_server_message() {
    init_logger();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/users"))
        .respond_with(ResponseTemplate::new(422).set_body_json(serde_json::json!({
            "error": "Email already in use"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut ctx = setup_ctx(&server.uri());
    {
        let directory = ctx.state_mut::<DirectoryState>();
        directory.open_create_form(Role::SystemAdmin);
        let form = directory.create_form_mut().unwrap();
        form.name = "New Customer".to_string();
        form.email = "taken@customer.example".to_string();
        form.password = "hunter2".to_string();
    }
    ctx.state_mut::<CreateUserInput>().request = Some(CreateUserRequest {
        name: "New Customer".to_string(),
        email: "taken@customer.example".to_string(),
        password: "hunter2".to_string(),
        role: Role::Customer,
    });

    ctx.dispatch_and_sync::<CreateUserCommand>().await;
    let refresh = reconcile_directory(&mut ctx, Utc::now());
    assert!(!refresh);

    let directory = ctx.state::<DirectoryState>();
    // Entered data survives the failure for a retry.
    let form = directory.create_form().unwrap();
    assert_eq!(form.email, "taken@customer.example");
    assert!(!form.in_flight);
    let notification = directory.notification().unwrap();
    assert_eq!(notification.kind, NotificationKind::Error);
    assert_eq!(notification.message, "Email already in use");
}

#[tokio::test]
async fn update_modules_sends_full_grants_and_closes_form() {
    init_logger();
    let server = MockServer::start().await;
    let expected_body = serde_json::json!({
        "modules": [
            {"moduleId": "quotes", "name": "Quotes", "permissions": ["read", "write"]},
            {"moduleId": "users", "name": "User Management", "permissions": ["read", "write"]}
        ]
    });
    Mock::given(method("PUT"))
        .and(path("/api/users/c-2/modules"))
        .and(header("authorization", format!("Bearer {TOKEN}").as_str()))
        .and(body_json(&expected_body))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut ctx = setup_ctx(&server.uri());
    let target: conship_business::users::UserAccount = serde_json::from_value(serde_json::json!({
        "_id": "c-2",
        "name": "Bob",
        "email": "bob@acme.example",
        "role": "customer_user",
        "active": true,
        "parentAccountId": "c-1"
    }))
    .unwrap();
    ctx.state_mut::<DirectoryState>().open_edit_form(&target);
    let (user_id, grants): (_, Vec<ModuleGrant>) = {
        let form = ctx
            .state_mut::<DirectoryState>()
            .edit_form_mut()
            .unwrap();
        form.toggle_module(ModuleId::Quotes);
        form.toggle_module(ModuleId::Users);
        (form.user_id, form.grants())
    };
    {
        let input = ctx.state_mut::<UpdateModulesInput>();
        input.user_id = Some(user_id);
        input.modules = grants;
    }

    ctx.dispatch_and_sync::<UpdateModulesCommand>().await;
    let refresh = reconcile_directory(&mut ctx, Utc::now());
    assert!(refresh);

    let directory = ctx.state::<DirectoryState>();
    assert!(directory.edit_form().is_none());
    assert_eq!(
        directory.notification().map(|n| n.message.as_str()),
        Some("User permissions updated")
    );
}

#[tokio::test]
async fn role_map_does_not_gate_the_command_layer() {
    init_logger();
    let server = MockServer::start().await;
    // The server is the authority: it rejects, and the rejection surfaces.
    Mock::given(method("POST"))
        .and(path("/api/users"))
        .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
            "message": "Insufficient permissions"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut ctx = setup_ctx(&server.uri());
    ctx.state_mut::<SessionConfig>().user = serde_json::from_value(serde_json::json!({
        "_id": "u-9",
        "name": "Carol",
        "email": "carol@acme.example",
        "role": "customer",
        "active": true
    }))
    .ok();
    // The UI would never offer this role to a customer, but a hand-crafted
    // dispatch still goes to the wire.
    ctx.state_mut::<CreateUserInput>().request = Some(CreateUserRequest {
        name: "Escalated".to_string(),
        email: "escalated@acme.example".to_string(),
        password: "hunter2".to_string(),
        role: Role::SystemAdmin,
    });

    ctx.dispatch_and_sync::<CreateUserCommand>().await;
    let _ = reconcile_directory(&mut ctx, Utc::now());

    assert_eq!(
        ctx.state::<DirectoryState>()
            .notification()
            .map(|n| n.message.as_str()),
        Some("Insufficient permissions")
    );
}

#[tokio::test]
async fn commands_skip_without_session_token() {
    init_logger();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/users/managed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(managed_users_body()))
        .expect(0)
        .mount(&server)
        .await;

    let mut ctx = setup_ctx(&server.uri());
    ctx.state_mut::<SessionConfig>().token = None;

    ctx.dispatch_and_sync::<FetchManagedUsersCommand>().await;
    let _ = reconcile_directory(&mut ctx, Utc::now());

    let directory = ctx.state::<DirectoryState>();
    assert!(directory.users().is_empty());
    assert!(directory.notification().is_none());
    assert!(matches!(
        ctx.state::<UsersFetchCache>().phase,
        RequestPhase::Idle
    ));
}
