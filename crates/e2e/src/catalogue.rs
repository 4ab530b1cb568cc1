//! Built-in blog application scenarios

use crate::config::Selectors;
use crate::error::E2eResult;
use crate::fixtures::Fixtures;
use crate::locator::Target;
use crate::spec::{Scenario, Step};

const ROOT: &str = "Blog app";
const LOGIN: &str = "Login";
const LOGGED_IN: &str = "When logged in";

const TITLE: &str = "My own E2E test";
const AUTHOR: &str = "doko doko";
const URL: &str = "e2e.com";

/// Text of a rendered blog entry in its collapsed form
pub fn entry_text(title: &str, author: &str) -> String {
    format!("{} {} view", title, author)
}

/// The blog application scenarios, in declaration order.
///
/// The first fixture user owns everything created; the second one is the
/// non-owner.
pub fn blog_app_scenarios(fixtures: &Fixtures, ui: &Selectors) -> E2eResult<Vec<Scenario>> {
    let owner = fixtures.owner()?;
    let other = fixtures.other()?;
    let wrong_password = format!("{}-wrong", owner.password);

    let created_entry = Target::text(&entry_text(TITLE, AUTHOR));

    let scenarios = vec![
        Scenario::new("Login form is shown")
            .in_group(&[ROOT])
            .tag("smoke")
            .step(Step::expect_visible(ui.login_prompt.clone()))
            .step(Step::expect_visible(ui.username_label.clone()))
            .step(Step::expect_visible(ui.password_label.clone()))
            .step(Step::expect_visible(ui.login_button.clone())),

        Scenario::new("succeeds with correct credentials")
            .in_group(&[ROOT, LOGIN])
            .tag("auth")
            .step(Step::login(&owner.username, &owner.password))
            .step(Step::expect_visible(Target::text(&ui.logged_in_text(&owner.name)))),

        Scenario::new("fails with wrong credentials")
            .in_group(&[ROOT, LOGIN])
            .tag("auth")
            .with_description("a wrong password shows an error and no session starts")
            .step(Step::login(&owner.username, &wrong_password))
            .step(Step::expect_visible(Target::text(&ui.login_error_text)))
            .step(Step::expect_hidden(Target::text(&ui.logged_in_text(&owner.name)))),

        Scenario::new("a new blog can be created")
            .in_group(&[ROOT, LOGIN, LOGGED_IN])
            .tag("blogs")
            .logged_in_as(&owner.username)
            .step(Step::create_blog(TITLE, AUTHOR, URL))
            .step(Step::expect_visible(created_entry.clone())),

        Scenario::new("a blog can be liked")
            .in_group(&[ROOT, LOGIN, LOGGED_IN])
            .tag("blogs")
            .tag("likes")
            .logged_in_as(&owner.username)
            .step(Step::create_blog(TITLE, AUTHOR, URL))
            .step(Step::click(ui.view_button.clone()))
            .step(Step::click(ui.like_button.clone()))
            .step(Step::expect_text(ui.likes_counter.clone(), "1")),

        Scenario::new("the user who added the blog can delete it")
            .in_group(&[ROOT, LOGIN, LOGGED_IN])
            .tag("blogs")
            .logged_in_as(&owner.username)
            .step(Step::create_blog(TITLE, AUTHOR, URL))
            .step(Step::click(ui.view_button.clone()))
            .step(Step::expect_visible(ui.remove_button.clone()))
            .step(Step::click_and_accept(ui.remove_button.clone()))
            .step(Step::expect_hidden(created_entry)),

        Scenario::new("user does not see remove button for blogs he did not create")
            .in_group(&[ROOT, LOGIN, LOGGED_IN])
            .tag("blogs")
            .logged_in_as(&owner.username)
            .step(Step::create_blog(TITLE, AUTHOR, URL))
            .step(Step::click(ui.logout_button.clone()))
            .step(Step::login(&other.username, &other.password))
            .step(Step::click(ui.view_button.clone()))
            .step(Step::expect_hidden(ui.remove_button.clone())),

        ordering_scenario(&other.username, &other.password, ui).logged_in_as(&owner.username),
    ];

    Ok(scenarios)
}

fn ordering_scenario(username: &str, password: &str, ui: &Selectors) -> Scenario {
    let like_first = Step::click(ui.like_button.clone().first());

    Scenario::new("blogs are ordered by likes in descending order")
        .in_group(&[ROOT, LOGIN, LOGGED_IN])
        .tag("blogs")
        .tag("likes")
        .step(Step::create_blog("First blog", AUTHOR, URL))
        .step(Step::create_blog("Third blog", AUTHOR, URL))
        .step(Step::create_blog("Second blog", AUTHOR, URL))
        .step(Step::click(ui.view_button.clone().first()))
        .step(like_first.clone())
        .step(like_first.clone())
        .step(like_first)
        .step(Step::click(ui.view_button.clone().last()))
        .step(Step::click(ui.like_button.clone().last()))
        .step(Step::click(ui.logout_button.clone()))
        .step(Step::login(username, password))
        .step(Step::expect_text(
            ui.blog_entry.clone().nth(0),
            &entry_text("First blog", AUTHOR),
        ))
        .step(Step::expect_text(
            ui.blog_entry.clone().nth(1),
            &entry_text("Second blog", AUTHOR),
        ))
        .step(Step::expect_text(
            ui.blog_entry.clone().nth(2),
            &entry_text("Third blog", AUTHOR),
        ))
}
