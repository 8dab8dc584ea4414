pub mod client;
pub mod db;
pub mod fixtures;
pub mod runner;
pub mod specs;

/// Invoke `$mac!(module::name)` for every check that leaves the target's data
/// as it found it (apart from freshly created fixtures).
///
/// This is the **single source of truth** for the check list. Adding a check
/// here registers it in `runner::run_all`, `deskcheck list` and the
/// integration tests.
#[macro_export]
macro_rules! for_each_spec {
    ($mac:ident) => {
        // auth (7)
        $mac!(auth::login_super_admin);
        $mac!(auth::login_wrong_password);
        $mac!(auth::login_missing_password);
        $mac!(auth::me_returns_profile);
        $mac!(auth::me_invalid_token);
        $mac!(auth::me_malformed_jwt);
        $mac!(auth::me_without_token);

        // jobdesks (17)
        $mac!(jobdesks::list_jobdesks);
        $mac!(jobdesks::create_for_listed_karyawan);
        $mac!(jobdesks::create_requires_assignee);
        $mac!(jobdesks::edit_as_super_admin);
        $mac!(jobdesks::edit_allowed_for_pengurus);
        $mac!(jobdesks::edit_denied_for_karyawan);
        $mac!(jobdesks::edit_denied_without_token);
        $mac!(jobdesks::edit_rejects_empty_update);
        $mac!(jobdesks::edit_unknown_id_not_found);
        $mac!(jobdesks::status_update_accepts_known_status);
        $mac!(jobdesks::status_update_rejects_unknown_status);
        $mac!(jobdesks::delete_denied_for_karyawan);
        $mac!(jobdesks::delete_denied_for_pengurus);
        $mac!(jobdesks::delete_denied_without_token);
        $mac!(jobdesks::delete_unknown_id_not_found);
        $mac!(jobdesks::delete_detaches_linked_todos);
        $mac!(jobdesks::karyawan_sees_assigned_jobdesk);

        // todo → daily log conversion (9)
        $mac!(todos::convert_requires_auth);
        $mac!(todos::convert_validates_hours_spent);
        $mac!(todos::convert_unknown_todo_not_found);
        $mac!(todos::convert_requires_jobdesk);
        $mac!(todos::convert_requires_done_status);
        $mac!(todos::convert_done_todo_creates_log);
        $mac!(todos::convert_twice_rejected);
        $mac!(todos::converted_log_is_listed);
        $mac!(todos::converted_flag_persisted);

        // password updates, read-only paths (6)
        $mac!(passwords::update_requires_token);
        $mac!(passwords::update_denied_for_karyawan);
        $mac!(passwords::super_admin_passes_authorization);
        $mac!(passwords::update_requires_new_password);
        $mac!(passwords::update_rejects_short_password);
        $mac!(passwords::update_unknown_user_not_found);

        // pwa (6)
        $mac!(pwa::vapid_key_is_p256_point);
        $mac!(pwa::save_subscription_requires_auth);
        $mac!(pwa::save_subscription_rejects_missing_endpoint);
        $mac!(pwa::save_and_remove_subscription);
        $mac!(pwa::offline_bundle_requires_auth);
        $mac!(pwa::offline_bundle_contains_user_data);
    };
}

/// Invoke `$mac!(module::name)` for checks that change an account's password.
/// Each one restores the original credentials before returning; they run
/// only when explicitly requested and always one at a time.
#[macro_export]
macro_rules! for_each_destructive_spec {
    ($mac:ident) => {
        $mac!(passwords::update_allows_login_with_new_password);
        $mac!(passwords::update_stores_bcrypt_hash);
    };
}
