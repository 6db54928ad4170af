//! Model forms for models whose network field is computed from stored columns

use super::field::FormField;
use super::form::{CleanForm, Form};
use super::ipnetwork::IpNetwork;
use crate::error::ValidationErrors;
use crate::model::ModelClean;
use serde_json::Value;
use std::marker::PhantomData;

/// Models exposing a computed `address`
pub trait AddressModel: ModelClean {
    fn address(&self) -> Option<IpNetwork>;
    fn set_address(&mut self, address: Option<IpNetwork>);
}

/// Models exposing a computed `prefix`
pub trait PrefixModel: ModelClean {
    fn prefix(&self) -> Option<IpNetwork>;
    fn set_prefix(&mut self, prefix: Option<IpNetwork>);
}

/// Accessor for the computed network attribute a form edits
pub trait NetworkAttribute<M> {
    const FIELD_NAME: &'static str;

    fn read(instance: &M) -> Option<IpNetwork>;
    fn write(instance: &mut M, value: Option<IpNetwork>);
}

/// The `address` attribute of an [`AddressModel`]
#[derive(Debug, Clone, Copy)]
pub struct Address;

/// The `prefix` attribute of a [`PrefixModel`]
#[derive(Debug, Clone, Copy)]
pub struct Prefix;

impl<M: AddressModel> NetworkAttribute<M> for Address {
    const FIELD_NAME: &'static str = "address";

    fn read(instance: &M) -> Option<IpNetwork> {
        instance.address()
    }

    fn write(instance: &mut M, value: Option<IpNetwork>) {
        instance.set_address(value);
    }
}

impl<M: PrefixModel> NetworkAttribute<M> for Prefix {
    const FIELD_NAME: &'static str = "prefix";

    fn read(instance: &M) -> Option<IpNetwork> {
        instance.prefix()
    }

    fn write(instance: &mut M, value: Option<IpNetwork>) {
        instance.set_prefix(value);
    }
}

/// Model form that seeds and writes back a computed network field
#[derive(Debug, Clone)]
pub struct NetworkFieldForm<M, A> {
    form: Form,
    instance: M,
    attribute: PhantomData<A>,
}

pub type AddressFieldMixin<M> = NetworkFieldForm<M, Address>;
pub type PrefixFieldMixin<M> = NetworkFieldForm<M, Prefix>;

impl<M, A> NetworkFieldForm<M, A>
where
    M: ModelClean + Default,
    A: NetworkAttribute<M>,
{
    /// Wrap `form`, adding the network field.
    ///
    /// Initial data passed in with the form wins; otherwise the field is
    /// seeded from the instance being edited.
    pub fn new(mut form: Form, instance: Option<M>) -> Self {
        let mut initial = form.initial().clone();
        if !initial.contains_key(A::FIELD_NAME) {
            if let Some(instance) = &instance {
                let value = A::read(instance)
                    .map(|network| Value::String(network.to_string()))
                    .unwrap_or(Value::Null);
                initial.insert(A::FIELD_NAME.to_string(), value);
            }
        }
        form.set_initial(initial);
        form.add_field(FormField::ip_network(A::FIELD_NAME));

        Self {
            form,
            instance: instance.unwrap_or_default(),
            attribute: PhantomData,
        }
    }

    pub fn instance(&self) -> &M {
        &self.instance
    }

    pub fn into_instance(self) -> M {
        self.instance
    }
}

impl<M, A> CleanForm for NetworkFieldForm<M, A>
where
    M: ModelClean,
    A: NetworkAttribute<M>,
{
    fn form(&self) -> &Form {
        &self.form
    }
    fn form_mut(&mut self) -> &mut Form {
        &mut self.form
    }

    fn clean(&mut self) -> Result<(), ValidationErrors> {
        // The instance must carry the value before model validation runs
        let value = self
            .form
            .cleaned_str(A::FIELD_NAME)
            .and_then(|value| value.parse().ok());
        A::write(&mut self.instance, value);
        self.instance.clean()
    }
}
