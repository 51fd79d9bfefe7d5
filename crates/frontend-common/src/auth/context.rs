//! Auth token context provider and hooks

use super::store::AuthTokenStore;
use yew::prelude::*;

/// Auth token provider props
#[derive(Properties, PartialEq)]
pub struct AuthTokenProviderProps {
    pub store: AuthTokenStore,
    pub children: Children,
}

/// Makes `store` available to every component below it
#[function_component(AuthTokenProvider)]
pub fn auth_token_provider(props: &AuthTokenProviderProps) -> Html {
    html! {
        <ContextProvider<AuthTokenStore> context={props.store.clone()}>
            {props.children.clone()}
        </ContextProvider<AuthTokenStore>>
    }
}

/// Hook to use the auth token store
#[hook]
pub fn use_auth_store() -> AuthTokenStore {
    use_context::<AuthTokenStore>()
        .expect("AuthTokenStore not found. Make sure to wrap your component with AuthTokenProvider")
}

/// Hook to get the current token; the component re-renders when it changes
#[hook]
pub fn use_auth_token() -> String {
    let store = use_auth_store();
    let token = use_state_eq(|| store.get());

    {
        let token = token.clone();
        use_effect_with(store, move |store| {
            let subscription = store.subscribe(move |value: &str| token.set(value.to_string()));
            // Unsubscribe on unmount or when the provider swaps stores
            move || drop(subscription)
        });
    }

    (*token).clone()
}

/// Hook to check if authenticated
#[hook]
pub fn use_is_authenticated() -> bool {
    !use_auth_token().is_empty()
}
