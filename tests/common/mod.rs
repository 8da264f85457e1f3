// Shared fixtures for doclint integration tests
#![allow(dead_code)]

use doclint::core::{DiagnosticCode, Language, Parameter, SourceUnit, Symbol, TestUnit, TypeRef};
use doclint::ValidationReport;
use indoc::indoc;

pub const USERS_SOURCE: &str = indoc! {"
    /**
     * Creates a user.
     *
     * @param email - Contact address
     * @param name? - Display name
     * @return - The stored user
     *   - id - Identifier
     *   - email - Contact address
     * @throws {ValidationError} when the email is malformed
     */
    export function createUser(email: string, name?: string): User {}

    /**
     * Deletes a user.
     *
     * @param id - Identifier
     * @throws {NotFoundError} when no user has the id
     */
    export function deleteUser(id: string): void {}

    /**
     * Updates a user's email.
     *
     * @param id - Identifier
     * @param email - New contact address
     */
    export function updateUser(id: string, email: string): void {}
"};

pub fn users_source() -> SourceUnit {
    SourceUnit::new("src/users.ts", USERS_SOURCE, Language::TypeScript)
        .with_symbol(
            Symbol::function("createUser", 11)
                .exported()
                .with_param(Parameter::new("email", TypeRef::named("string")))
                .with_param(Parameter::new("name", TypeRef::named("string")).optional())
                .with_return(TypeRef::structured(
                    "User",
                    vec![
                        doclint::core::Field::new("id", TypeRef::named("string")),
                        doclint::core::Field::new("email", TypeRef::named("string")),
                    ],
                ))
                .with_raise("ValidationError"),
        )
        .with_symbol(
            Symbol::function("deleteUser", 19)
                .exported()
                .with_param(Parameter::new("id", TypeRef::named("string")))
                .with_return(TypeRef::named("void"))
                .with_raise("NotFoundError"),
        )
        .with_symbol(
            Symbol::function("updateUser", 27)
                .exported()
                .with_param(Parameter::new("id", TypeRef::named("string")))
                .with_param(Parameter::new("email", TypeRef::named("string")))
                .with_return(TypeRef::named("void")),
        )
}

pub const USERS_TEST: &str = indoc! {"
    import { createUser, deleteUser } from './users';
    import { resetDb } from '../test/db';

    beforeEach(() => resetDb());

    describe('createUser', () => {
      it('returns {User} when the email is valid', () => {});
      it('throws {ValidationError} when the email is malformed', () => {});
    });

    describe('deleteUser', () => {
      it('returns {void} when the user exists', () => {});
      it('throws {NotFoundError} when the id is unknown', () => {});
    });
"};

pub fn users_test() -> TestUnit {
    TestUnit::new("src/users.test.ts", USERS_TEST, Language::TypeScript).paired_with("src/users.ts")
}

pub fn codes(report: &ValidationReport) -> Vec<DiagnosticCode> {
    report.diagnostics.iter().map(|d| d.code).collect()
}
