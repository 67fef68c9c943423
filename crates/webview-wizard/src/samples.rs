//! Ready-made wizards used by the demo host and the test suite.

use futures_util::FutureExt;

use crate::definition::{FieldDefinition, FieldType, PageDefinition, WizardDefinition};
use crate::parameters::ParameterMap;
use crate::template::Template;
use crate::validation::{FieldStateDelta, Severity, ValidatorResponse};
use crate::workflow::{FinishResponse, Workflow};

/// A two-page wizard with a linear workflow.
///
/// `page1` asks for a username and comments on a few well-known ones;
/// `b` and `Max` are rejected. `page2` requires a favorite color.
pub fn linear_wizard() -> WizardDefinition {
    WizardDefinition::new("Two Page Linear Wizard")
        .with_description("This is a two page wizard with a linear workflow")
        .with_page(
            PageDefinition::new("page1")
                .with_title("Who Are You?")
                .with_description("Before we can proceed, tell me who you are!")
                .with_field(FieldDefinition::textbox("addusername", "Username"))
                .with_validator(|ctx| {
                    let message = match ctx.parameters.text("addusername").as_str() {
                        "Max" => Some((Severity::Error, "Max is not allowed to use this wizard. Sorry Max!")),
                        "b" => Some((Severity::Error, "Username must be longer than one letter.")),
                        "Fred" => Some((Severity::Warn, "Fred may cause you to have to do more work")),
                        "El Jefe" => Some((
                            Severity::Info,
                            "I am overjoyed to see my overlord, El Jefe, long may he reign!",
                        )),
                        _ => None,
                    };
                    match message {
                        Some((severity, content)) => {
                            ValidatorResponse::new().with_item(severity, "addusername", content)
                        }
                        None => ValidatorResponse::new(),
                    }
                }),
        )
        .with_page(
            PageDefinition::new("page2")
                .with_title("Stuff You Like")
                .with_description("Tell us more about yourself!")
                .with_field(FieldDefinition::textbox("favcolor", "Favorite Color"))
                .with_validator(|ctx| {
                    if ctx.parameters.text("favcolor").is_empty() {
                        ValidatorResponse::new().with_item(
                            Severity::Error,
                            "favcolor",
                            "Favorite Color must not be empty.",
                        )
                    } else {
                        ValidatorResponse::new()
                    }
                }),
        )
}

/// Initial values for [`linear_wizard`].
pub fn linear_wizard_data() -> ParameterMap {
    ParameterMap::new().with("addusername", "bob")
}

/// A three-page wizard that branches on `age`.
///
/// Next from `page1` goes to `page2adult` for ages of 18 and up, otherwise to
/// `page2child`. Back from either returns to `page1`. Finishing closes the
/// wizard and reports the collected values.
pub fn age_branch_wizard() -> WizardDefinition {
    let workflow = Workflow::new(
        |_wizard, params| match params.number("age") {
            Some(age) if age < 18.0 => !params.text("guardian").is_empty(),
            Some(_) => true,
            None => false,
        },
        |_wizard, params| {
            let summary = params.to_value();
            async move {
                Ok(Some(
                    FinishResponse::closing(summary)
                        .with_template(Template::inline("content", "<p>Thanks, {{name}}.</p>")),
                ))
            }
            .boxed()
        },
    )
    .with_next_page(|page, _wizard, params| {
        Ok(match (page.id(), params.number("age")) {
            ("page1", Some(age)) if age >= 18.0 => Some("page2adult".to_string()),
            ("page1", Some(_)) => Some("page2child".to_string()),
            _ => None,
        })
    })
    .with_previous_page(|page, _wizard, _params| {
        Ok(match page.id() {
            "page2adult" | "page2child" => Some("page1".to_string()),
            _ => None,
        })
    });

    WizardDefinition::new("Age Branch Wizard")
        .with_description("The second page depends on your age")
        .with_page(
            PageDefinition::new("page1")
                .with_title("About You")
                .with_field(FieldDefinition::textbox("name", "Name"))
                .with_field(FieldDefinition::new("age", FieldType::Number, "Age"))
                .with_validator(|ctx| match ctx.parameters.number("age") {
                    Some(age) if age >= 0.0 => ValidatorResponse::new(),
                    _ => ValidatorResponse::new().with_item(Severity::Error, "age", "Age must be a number."),
                }),
        )
        .with_page(
            PageDefinition::new("page2adult")
                .with_title("Adults")
                .with_field(FieldDefinition::new("newsletter", FieldType::Checkbox, "Send me the newsletter")),
        )
        .with_page(
            PageDefinition::new("page2child")
                .with_title("Children")
                .with_field(FieldDefinition::textbox("guardian", "Guardian's name"))
                .with_validator(|ctx| {
                    if ctx.parameters.text("guardian").is_empty() {
                        ValidatorResponse::new().with_item(
                            Severity::Error,
                            "guardian",
                            "A guardian is required.",
                        )
                    } else {
                        ValidatorResponse::new()
                    }
                }),
        )
        .with_workflow_manager(workflow)
}

/// A one-page wizard whose validator enables `actualAge` only while
/// `over18` is checked.
pub fn field_refresh_wizard() -> WizardDefinition {
    WizardDefinition::new("Field Refresh Wizard")
        .with_page(
            PageDefinition::new("page1")
                .with_title("Age Check")
                .with_field(FieldDefinition::new("over18", FieldType::Checkbox, "I am over 18"))
                .with_field(FieldDefinition::new("actualAge", FieldType::Number, "Actual age").disabled())
                .with_validator(|ctx| {
                    let over18 = ctx.parameters.flag("over18");
                    let mut response = ValidatorResponse::new()
                        .with_refresh("actualAge", FieldStateDelta::new().enabled(over18));
                    if over18 && ctx.parameters.number("actualAge").is_some_and(|age| age < 18.0) {
                        response = response.with_item(
                            Severity::Error,
                            "actualAge",
                            "That is not over 18.",
                        );
                    }
                    response
                }),
        )
        .with_dirty_state()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_samples_are_valid() {
        assert!(linear_wizard().check().is_ok());
        assert!(age_branch_wizard().check().is_ok());
        assert!(field_refresh_wizard().check().is_ok());
    }

    #[test]
    fn test_linear_initial_data() {
        let data = linear_wizard().initial_data(&linear_wizard_data());
        assert_eq!(data.get_str("addusername"), Some("bob"));
    }
}
