use {
    crate::{
        boundary::{AssetCustody, CustodyError},
        primitives::Address,
    },
    std::{collections::HashMap, fmt::Display, hash::Hash, sync::Mutex},
};

/// Ownership registry for assets identified by value.
#[derive(Debug)]
pub struct InMemoryCustody<A> {
    owners: Mutex<HashMap<A, Address>>,
}

impl<A> Default for InMemoryCustody<A> {
    fn default() -> Self {
        Self {
            owners: Mutex::new(HashMap::new()),
        }
    }
}

impl<A: Eq + Hash> InMemoryCustody<A> {
    /// Current owner of `asset`, if the registry has ever seen it.
    pub fn owner(&self, asset: &A) -> Option<Address> {
        self.owners.lock().unwrap().get(asset).copied()
    }

    /// Records `owner` as the owner of `asset`.
    pub fn register(&self, asset: A, owner: Address) {
        self.owners.lock().unwrap().insert(asset, owner);
    }
}

impl<A> AssetCustody<A> for InMemoryCustody<A>
where
    A: Eq + Hash + Display + Send,
{
    fn release(&self, asset: A, to: Address) -> Result<(), (A, CustodyError)> {
        let mut owners = self.owners.lock().unwrap();
        if to.is_zero() {
            let err = CustodyError {
                to,
                reason: format!("{asset} cannot be released to the zero address"),
            };
            return Err((asset, err));
        }
        tracing::debug!(%asset, %to, "released asset");
        owners.insert(asset, to);
        Ok(())
    }
}
