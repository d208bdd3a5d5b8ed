//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. When a
//! migration changes the schema, regenerate with `diesel print-schema` or
//! update by hand.

diesel::table! {
    /// Named permission groupings.
    roles (id) {
        id -> Int4,
        /// Unique, case-sensitive (constraint `roles_name_key`).
        #[max_length = 80]
        name -> Varchar,
        #[max_length = 255]
        description -> Varchar,
    }
}

diesel::table! {
    /// Registered accounts and their login telemetry.
    users (id) {
        id -> Int4,
        /// Unique login (constraint `users_email_key`).
        #[max_length = 255]
        email -> Varchar,
        #[max_length = 255]
        password_hash -> Varchar,
        #[max_length = 45]
        first_name -> Nullable<Varchar>,
        #[max_length = 45]
        last_name -> Nullable<Varchar>,
        active -> Bool,
        confirmed_at -> Nullable<Timestamptz>,
        last_login_at -> Nullable<Timestamptz>,
        current_login_at -> Nullable<Timestamptz>,
        #[max_length = 100]
        last_login_ip -> Nullable<Varchar>,
        #[max_length = 100]
        current_login_ip -> Nullable<Varchar>,
        login_count -> Int4,
    }
}

diesel::table! {
    /// Many-to-many link between users and roles.
    roles_users (user_id, role_id) {
        user_id -> Int4,
        role_id -> Int4,
    }
}

diesel::joinable!(roles_users -> roles (role_id));
diesel::joinable!(roles_users -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(roles, roles_users, users);
