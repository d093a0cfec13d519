//! Property-based tests for caller identity.

use auth_service::device::generator::{
    DeviceAuthorizationGenerator, TOKEN_LENGTH, VERIFICATION_CODE_ALPHABET,
    VERIFICATION_CODE_LENGTH,
};
use auth_service::identity::{AuthMethod, Details, Identity};
use proptest::prelude::*;

fn arb_method() -> impl Strategy<Value = AuthMethod> {
    prop_oneof![
        Just(AuthMethod::ServiceSecret),
        Just(AuthMethod::AccessToken),
        Just(AuthMethod::SessionToken),
        Just(AuthMethod::RestrictedToken),
    ]
}

/// Empty or a plausible user ID.
fn arb_user_id() -> impl Strategy<Value = String> {
    prop_oneof![Just(String::new()), "[a-f0-9]{10}"]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Every identity is exactly one of service or user.
    #[test]
    fn prop_service_and_user_are_exclusive(
        method in arb_method(),
        user_id in arb_user_id(),
        token in "[A-Za-z0-9]{0,16}",
    ) {
        let identity = Identity::new(method, user_id, token);
        prop_assert_ne!(identity.is_service(), identity.is_user());
    }

    /// A session identity is a service exactly when it names no user.
    #[test]
    fn prop_session_service_iff_no_user(user_id in arb_user_id()) {
        let identity = Identity::session(user_id.clone(), "t");
        prop_assert_eq!(identity.is_service(), user_id.is_empty());
        prop_assert_eq!(identity.is_server(), user_id.is_empty());
    }

    /// Token-bearing methods never count as services unless they are
    /// server sessions.
    #[test]
    fn prop_token_methods_are_users(user_id in arb_user_id()) {
        for method in [AuthMethod::AccessToken, AuthMethod::RestrictedToken] {
            let identity = Identity::new(method, user_id.clone(), "t");
            prop_assert!(identity.is_user());
            prop_assert!(identity.has_token());
        }
    }

    /// Only the service secret lacks a forwardable token.
    #[test]
    fn prop_has_token(method in arb_method()) {
        let identity = Identity::new(method, "u1", "t");
        prop_assert_eq!(identity.has_token(), method != AuthMethod::ServiceSecret);
    }

    /// Method names parse back to the same method.
    #[test]
    fn prop_method_names_parse(method in arb_method()) {
        prop_assert_eq!(method.as_str().parse::<AuthMethod>(), Ok(method));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// Generated device codes and tokens keep their shape.
    #[test]
    fn prop_device_secrets_shape(_seed in any::<u8>()) {
        let code = DeviceAuthorizationGenerator::generate_verification_code();
        prop_assert_eq!(code.len(), VERIFICATION_CODE_LENGTH);
        prop_assert!(code.bytes().all(|b| VERIFICATION_CODE_ALPHABET.contains(&b)));

        let token = DeviceAuthorizationGenerator::generate_token();
        prop_assert_eq!(token.len(), TOKEN_LENGTH);
        prop_assert!(token.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_'));
    }
}

#[test]
fn test_fixed_identities() {
    let server = Identity::session("", "t");
    assert!(server.is_service());
    assert!(!server.is_user());

    let user = Identity::session("u1", "t");
    assert!(!user.is_service());
    assert!(user.is_user());

    let service = Identity::service_secret();
    assert!(service.is_service());
    assert!(!service.has_token());
}
