pub mod providers;
pub mod secrets;
pub mod token;

pub use secrets::{SecretCipher, SecretError};
pub use token::{IssuedToken, TokenError, TokenIssuer};

pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{AuthError, AuthService, AuthenticatedUser, Registration, UserInfo};
pub use auth_service_impl::SeaOrmAuthService;

pub mod integration_service;
pub mod integration_service_impl;
pub use integration_service::{
    CreateIntegrationRequest, IntegrationError, IntegrationService, IntegrationView,
    UpdateIntegrationRequest,
};
pub use integration_service_impl::SeaOrmIntegrationService;

pub mod recipe_service;
pub mod recipe_service_impl;
pub use recipe_service::{
    Pagination, RecipeError, RecipeItem, RecipePage, RecipeQuery, RecipeService, SeedReport,
};
pub use recipe_service_impl::SeaOrmRecipeService;
