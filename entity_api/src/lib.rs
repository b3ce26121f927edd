use chrono::Utc;
use log::*;
use sea_orm::DatabaseConnection;

pub use entity::{
    channel, notification_templates, notifications, priority, roles, users, variant, Id,
};

pub mod error;
#[cfg(any(test, feature = "memory"))]
pub mod memory;
pub mod notification;
pub mod notification_template;
pub mod store;
pub mod user;

/// Inserts an administrator and the stock notification templates the CRM
/// raises from its lead and shipment workflows.
pub async fn seed_database(db: &DatabaseConnection) -> Result<(), error::Error> {
    let now = Utc::now();

    let admin = user::create(
        db,
        users::Model {
            id: Id::nil(),
            email: "admin@notifier.local".to_owned(),
            display_name: Some("Admin User".to_owned()),
            password: "admin-change-me".to_owned(),
            role: roles::Role::SuperAdmin,
            country: None,
            created_at: now.into(),
            updated_at: now.into(),
        },
    )
    .await?;
    info!("Seeded admin user {}", admin.email);

    let templates = [
        (
            "welcome",
            "onboarding",
            "Hi {{name}}",
            Some("Welcome aboard, {{name}}!"),
            variant::Variant::Default,
            priority::Priority::Normal,
            false,
            vec!["name"],
        ),
        (
            "lead_assigned",
            "leads",
            "New lead: {{lead_name}}",
            Some("{{assigned_by}} assigned lead {{lead_name}} to you."),
            variant::Variant::Info,
            priority::Priority::High,
            true,
            vec!["lead_name", "assigned_by"],
        ),
        (
            "shipment_status_changed",
            "shipments",
            "Shipment {{tracking_number}} is {{status}}",
            None,
            variant::Variant::Warning,
            priority::Priority::Normal,
            false,
            vec!["tracking_number", "status"],
        ),
    ];

    for (name, category, title, description, variant, priority, persistent, variables) in
        templates
    {
        let template = notification_template::create(
            db,
            notification_templates::Model {
                id: Id::nil(),
                name: name.to_owned(),
                category: category.to_owned(),
                title: title.to_owned(),
                description: description.map(str::to_owned),
                variant,
                priority,
                persistent,
                channel: channel::Channel::InApp,
                variables: variables.into_iter().map(str::to_owned).collect(),
                active: true,
                created_at: now.into(),
                updated_at: now.into(),
            },
        )
        .await?;
        info!("Seeded notification template {}", template.name);
    }

    Ok(())
}
