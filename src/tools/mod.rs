pub mod compare;
pub mod contact;
pub mod insurance_data;
pub mod quote_form;
pub mod registry;
pub mod schema;
pub mod testimonials;

pub use compare::{CompareInsurancesTool, Comparison, PricePolicy, PricedProduct};
pub use contact::{ContactInfo, GetContactInfoTool};
pub use insurance_data::{CoverageRow, InsuranceProduct, PageInsuranceDataTool};
pub use quote_form::{FillQuoteFormTool, QuoteRequest, QuoteSubmitter, WebhookSubmitter};
pub use registry::{
    CallRequest, CallResult, ParameterSchema, PropertySchema, Tool, ToolDeclaration, ToolRegistry,
};
pub use schema::call_request_schema_json;
pub use testimonials::{GetTestimonialsTool, Testimonial};
