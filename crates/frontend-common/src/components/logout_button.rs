//! Logout button component

use crate::auth::{use_auth_store, use_is_authenticated};
use yew::prelude::*;

#[derive(Properties, Clone, PartialEq)]
pub struct LogoutButtonProps {
    #[prop_or(AttrValue::Static("Log out"))]
    pub label: AttrValue,
    #[prop_or_default]
    pub class: Classes,
}

/// Clears the auth token and sends the user to the login page
#[function_component(LogoutButton)]
pub fn logout_button(props: &LogoutButtonProps) -> Html {
    let store = use_auth_store();
    let is_authenticated = use_is_authenticated();

    let onclick = Callback::from(move |e: MouseEvent| {
        e.prevent_default();
        store.force_logout();
    });

    html! {
        <button
            type="button"
            class={props.class.clone()}
            disabled={!is_authenticated}
            {onclick}
        >
            {props.label.clone()}
        </button>
    }
}
