mod common;

use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use productpulse::models::{NewUser, UserChanges};
use productpulse::views::admin::{ANALYTICS_FETCH_FAILED, DELETE_PROMPT};
use productpulse::views::{AdminDashboardView, AssumeYes, Confirm, DashboardDisplay, UserManagementView};

/// Answers every prompt the same way and remembers what it was asked
struct Scripted {
    answer: bool,
    prompts: Mutex<Vec<String>>,
}

impl Scripted {
    fn new(answer: bool) -> Self {
        Self { answer, prompts: Mutex::new(Vec::new()) }
    }
}

#[async_trait]
impl Confirm for Scripted {
    async fn confirm(&self, prompt: &str) -> bool {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.answer
    }
}

fn new_user(email: &str, password: &str) -> NewUser {
    NewUser {
        email: email.into(),
        password: password.into(),
        nickname: Some("Newbie".into()),
        is_admin: false,
    }
}

#[tokio::test]
async fn admin_lists_users() -> Result<()> {
    let backend = common::spawn_backend().await?;
    let session = backend.admin_session().await?;
    let view = UserManagementView::new(session.client().clone());

    view.refresh().await;
    let users = view.state().data().cloned().expect("users loaded");
    assert_eq!(users.len(), 2);
    assert_eq!(users[0].display_name(), "Ada");
    assert_eq!(users[1].display_name(), "No Nickname");
    Ok(())
}

#[tokio::test]
async fn create_refetches_on_success_only() -> Result<()> {
    let backend = common::spawn_backend().await?;
    let session = backend.admin_session().await?;
    let view = UserManagementView::new(session.client().clone());

    let notice = view.create(new_user("new@example.com", "pw-123")).await;
    assert!(!notice.is_error());
    assert_eq!(notice.message, "User created successfully!");
    assert_eq!(view.state().data().map(Vec::len), Some(3));
    assert_eq!(backend.count("GET /api/v1/admin/users"), 1);

    let notice = view.create(new_user("new@example.com", "pw-456")).await;
    assert!(notice.is_error());
    assert_eq!(notice.message, "Email already registered");
    assert_eq!(backend.count("GET /api/v1/admin/users"), 1);
    Ok(())
}

#[tokio::test]
async fn create_requires_email_and_password() -> Result<()> {
    let backend = common::spawn_backend().await?;
    let session = backend.admin_session().await?;
    let view = UserManagementView::new(session.client().clone());

    let notice = view.create(new_user("someone@example.com", "")).await;
    assert!(notice.is_error());
    assert_eq!(notice.message, "Email and password are required.");
    assert_eq!(backend.count("POST /api/v1/admin/users"), 0);
    Ok(())
}

#[tokio::test]
async fn update_sends_only_changed_fields() -> Result<()> {
    let backend = common::spawn_backend().await?;
    let session = backend.admin_session().await?;
    let view = UserManagementView::new(session.client().clone());

    let changes = UserChanges { nickname: Some("Mo".into()), ..Default::default() };
    let notice = view.update(2, changes).await;
    assert_eq!(notice.message, "User updated successfully!");

    let users = view.state().data().cloned().expect("refetched");
    let member = users.iter().find(|u| u.id == 2).expect("member");
    assert_eq!(member.display_name(), "Mo");
    assert_eq!(member.email, common::MEMBER_EMAIL);
    assert!(!member.is_admin);

    let notice = view.update(404, UserChanges { is_admin: Some(true), ..Default::default() }).await;
    assert!(notice.is_error());
    assert_eq!(notice.message, "User not found");
    Ok(())
}

#[tokio::test]
async fn declined_delete_makes_no_request() -> Result<()> {
    let backend = common::spawn_backend().await?;
    let session = backend.admin_session().await?;
    let view = UserManagementView::new(session.client().clone());
    let confirm = Scripted::new(false);

    assert_eq!(view.delete(2, &confirm).await, None);
    assert_eq!(confirm.prompts.lock().unwrap().as_slice(), [DELETE_PROMPT]);
    assert_eq!(backend.count("DELETE"), 0);
    backend.with(|s| assert_eq!(s.users.len(), 2));
    Ok(())
}

#[tokio::test]
async fn confirmed_delete_removes_and_refetches() -> Result<()> {
    let backend = common::spawn_backend().await?;
    let session = backend.admin_session().await?;
    let view = UserManagementView::new(session.client().clone());

    let notice = view.delete(2, &AssumeYes).await.expect("confirmed");
    assert_eq!(notice.message, "User deleted successfully!");
    assert_eq!(backend.count("DELETE /api/v1/admin/users/2"), 1);

    let users = view.state().data().cloned().expect("refetched");
    assert!(users.iter().all(|u| u.id != 2));

    let notice = view.delete(2, &AssumeYes).await.expect("confirmed");
    assert!(notice.is_error());
    Ok(())
}

#[tokio::test]
async fn dashboard_counts_for_admins_only() -> Result<()> {
    let backend = common::spawn_backend().await?;

    let admin = backend.admin_session().await?;
    let view = AdminDashboardView::new(admin.client().clone());
    view.fetch().await;
    let DashboardDisplay::Stats(stats) = view.render() else {
        panic!("expected stats, got {:?}", view.render());
    };
    assert_eq!(stats.total_users, 2);
    assert_eq!(stats.total_uploads, 3);
    assert_eq!(stats.total_analysis_results, 2);
    assert_eq!(stats.uploads_with_status("completed"), 2);
    assert_eq!(stats.uploads_with_status("failed"), 0);

    let member = backend.member_session().await?;
    let denied = AdminDashboardView::new(member.client().clone());
    denied.fetch().await;
    assert_eq!(
        denied.render(),
        DashboardDisplay::Error { message: ANALYTICS_FETCH_FAILED.to_string() }
    );
    Ok(())
}
